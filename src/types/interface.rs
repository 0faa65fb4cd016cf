use crate::{DynSvc, Service, Svc};
use std::any::TypeId;

/// Indicates that a type can be requested from the container. Every sized
/// service type is an interface for itself. Trait objects (`dyn Trait`) are
/// interfaces for the types listed in their [`interface!`] declaration, and
/// components of those types can be aliased as the interface with
/// [`ComponentBuilder::alias()`](crate::ComponentBuilder::alias).
///
/// This trait should usually be implemented automatically by the
/// [`interface!`] macro.
pub trait Interface: Service {
    /// Whether this is a trait object interface rather than a concrete type.
    fn is_interface() -> bool;

    /// Whether values of the given concrete type can be used as this
    /// interface.
    fn implemented_by(ty: TypeId) -> bool;

    /// Attempts to convert a type-erased service into this interface.
    fn downcast(service: DynSvc) -> Option<Svc<Self>>;
}

impl<T: Service> Interface for T {
    fn is_interface() -> bool {
        false
    }

    fn implemented_by(ty: TypeId) -> bool {
        ty == TypeId::of::<T>()
    }

    fn downcast(service: DynSvc) -> Option<Svc<Self>> {
        service.downcast::<T>().ok()
    }
}

/// Marks a trait as being an interface for many other types. This means that
/// a request for the given trait can resolve to any component of the types
/// indicated by this macro invocation, as long as that component is aliased
/// as the interface.
///
/// The `Send` and `Sync` supertrait requirements are only necessary when
/// compiling with the "arc" feature.
///
/// # Example
///
/// ```
/// use runtime_resolver::{interface, Service, Type};
///
/// struct Bar;
/// #[cfg(test)]
/// struct MockBar;
///
/// trait Foo: Service {}
/// impl Foo for Bar {}
/// #[cfg(test)]
/// impl Foo for MockBar {}
///
/// // Requests for `dyn Foo` can resolve to either `Bar` or, in a test run,
/// // `MockBar`. Note that attributes are allowed on each of the listed types.
/// interface!(
///     Foo = [
///         Bar,
///         #[cfg(test)]
///         MockBar,
///     ]
/// );
///
/// assert!(Type::of::<Bar>().implements(&Type::of::<dyn Foo>()));
/// ```
#[macro_export]
macro_rules! interface {
    ($trait:tt = [$($(#[$attr:meta])* $impl:ty),* $(,)?]) => {
        impl $crate::Interface for dyn $trait {
            fn is_interface() -> bool {
                true
            }

            #[allow(unused_variables)]
            fn implemented_by(ty: ::std::any::TypeId) -> bool {
                let implemented = false;
                $(
                    $(#[$attr])*
                    let implemented = implemented || ty == ::std::any::TypeId::of::<$impl>();
                )*
                implemented
            }

            #[allow(unused_variables)]
            fn downcast(
                service: $crate::DynSvc,
            ) -> ::std::option::Option<$crate::Svc<Self>> {
                $(
                    $(#[$attr])*
                    let service = match service.downcast::<$impl>() {
                        ::std::result::Result::Ok(service) => {
                            return ::std::option::Option::Some(service as $crate::Svc<Self>);
                        }
                        ::std::result::Result::Err(service) => service,
                    };
                )*
                ::std::option::Option::None
            }
        }
    };
}
