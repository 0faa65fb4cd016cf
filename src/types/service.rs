pub(crate) trait MapContainerEx<T> {
    fn new(value: T) -> Self;
    fn with_inner<R, F: FnOnce(&T) -> R>(&self, f: F) -> R;
    fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R;
}

#[cfg(feature = "arc")]
mod types {
    use super::MapContainerEx;
    use crate::{InjectResult, Value};
    use std::{
        any::Any,
        sync::{Arc, Mutex, PoisonError},
    };

    /// A reference-counted pointer holding a service. The pointer type is
    /// determined by the feature flags passed to this crate.
    pub type Svc<T> = Arc<T>;

    /// A reference-counted service pointer holding an instance of `dyn Any`.
    pub type DynSvc = Arc<dyn Any + Send + Sync>;

    /// Implemented automatically on types that are capable of being a service.
    pub trait Service: Any + Send + Sync {}
    impl<T: ?Sized + Any + Send + Sync> Service for T {}

    pub(crate) type DynCall =
        dyn Fn(&[Value]) -> InjectResult<Vec<Value>> + Send + Sync;
    pub(crate) type DynBuild =
        dyn Fn(&Value) -> InjectResult<DynSvc> + Send + Sync;
    pub(crate) type DynFieldFilter = dyn Fn(&str) -> bool + Send + Sync;

    pub(crate) type MapContainer<T> = Arc<Mutex<T>>;

    /// A value which is initialized at most once, blocking concurrent
    /// initializers until the first one finishes.
    pub(crate) type OnceSlot<T> = once_cell::sync::OnceCell<T>;

    impl<T> MapContainerEx<T> for MapContainer<T> {
        fn new(value: T) -> Self {
            Arc::new(Mutex::new(value))
        }

        fn with_inner<R, F: FnOnce(&T) -> R>(&self, f: F) -> R {
            f(&*self.lock().unwrap_or_else(PoisonError::into_inner))
        }

        fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
            f(&mut *self.lock().unwrap_or_else(PoisonError::into_inner))
        }
    }
}

#[cfg(feature = "rc")]
mod types {
    use super::MapContainerEx;
    use crate::{InjectResult, Value};
    use std::{any::Any, cell::RefCell, rc::Rc};

    /// A reference-counted pointer holding a service. The pointer type is
    /// determined by the feature flags passed to this crate.
    pub type Svc<T> = Rc<T>;

    /// A reference-counted service pointer holding an instance of `dyn Any`.
    pub type DynSvc = Rc<dyn Any>;

    /// Implemented automatically on types that are capable of being a service.
    pub trait Service: Any {}
    impl<T: ?Sized + Any> Service for T {}

    pub(crate) type DynCall = dyn Fn(&[Value]) -> InjectResult<Vec<Value>>;
    pub(crate) type DynBuild = dyn Fn(&Value) -> InjectResult<DynSvc>;
    pub(crate) type DynFieldFilter = dyn Fn(&str) -> bool;

    pub(crate) type MapContainer<T> = Rc<RefCell<T>>;

    /// A value which is initialized at most once.
    pub(crate) type OnceSlot<T> = once_cell::unsync::OnceCell<T>;

    impl<T> MapContainerEx<T> for MapContainer<T> {
        fn new(value: T) -> Self {
            Rc::new(RefCell::new(value))
        }

        fn with_inner<R, F: FnOnce(&T) -> R>(&self, f: F) -> R {
            f(&*self.borrow())
        }

        fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
            f(&mut *self.borrow_mut())
        }
    }
}

#[allow(clippy::wildcard_imports)]
pub use types::*;
