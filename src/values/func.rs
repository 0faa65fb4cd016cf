use crate::{
    BoxError, DynCall, InjectError, InjectResult, Request, Requirement,
    Service, Svc, Type, Value,
};
use std::fmt::{Debug, Formatter};

/// A function whose parameters can be resolved by the container. All
/// functions of arity 12 or less whose parameters are valid [`Request`]s can
/// be converted into a `Func`.
///
/// ```
/// use runtime_resolver::{Func, Svc, Type};
///
/// fn describe(count: Svc<u32>) -> String {
///     format!("{} items", count)
/// }
///
/// let func = Func::of(describe);
/// assert_eq!(1, func.arity());
/// assert_eq!(vec![Type::of::<String>()], func.results().collect::<Vec<_>>());
/// ```
#[derive(Clone)]
pub struct Func {
    name: String,
    params: Vec<Requirement>,
    returns: Vec<Type>,
    call: Svc<DynCall>,
}

impl Func {
    /// Creates a function from its signature and a type-erased body. The body
    /// receives one value per parameter and produces one value per non-error
    /// return.
    pub fn new(
        name: impl Into<String>,
        params: Vec<Requirement>,
        returns: Vec<Type>,
        call: impl Fn(&[Value]) -> InjectResult<Vec<Value>> + Service,
    ) -> Self {
        Func {
            name: name.into(),
            params,
            returns,
            call: Svc::new(call),
        }
    }

    /// Reflects a function returning a single service.
    pub fn of<D, F: IntoFunc<D>>(func: F) -> Self {
        func.into_func()
    }

    /// Reflects a function returning a `Result`. The error becomes the error
    /// slot of the function rather than a component.
    pub fn fallible<D, F: IntoFallibleFunc<D>>(func: F) -> Self {
        func.into_fallible_func()
    }

    /// Reflects a function returning a tuple of services, each of which
    /// becomes its own output.
    pub fn multi<D, F: IntoMultiFunc<D>>(func: F) -> Self {
        func.into_multi_func()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &[Requirement] {
        &self.params
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Every declared return type, including the error slot.
    #[must_use]
    pub fn returns(&self) -> &[Type] {
        &self.returns
    }

    /// The non-error return types. Each becomes a component when the
    /// function is provided.
    pub fn results(&self) -> impl Iterator<Item = Type> + '_ {
        self.returns.iter().copied().filter(|ty| !ty.is_error())
    }

    pub(crate) fn invoke(&self, args: &[Value]) -> InjectResult<Vec<Value>> {
        (self.call)(args)
    }
}

impl PartialEq for Func {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && Svc::as_ptr(&self.call).cast::<()>()
                == Svc::as_ptr(&other.call).cast::<()>()
    }
}

impl Debug for Func {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Func")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish()
    }
}

/// A function which can be reflected into a [`Func`] returning one service.
///
/// # Type parameters
/// * `D` - Parameters of this function as a tuple.
pub trait IntoFunc<D>: Service {
    /// The service returned by the function.
    type Output: Service;

    fn into_func(self) -> Func;
}

/// A function returning `Result<R, E>` which can be reflected into a
/// [`Func`].
pub trait IntoFallibleFunc<D>: Service {
    /// The service returned on success.
    type Output: Service;

    fn into_fallible_func(self) -> Func;
}

/// A function returning a tuple of services which can be reflected into a
/// [`Func`].
pub trait IntoMultiFunc<D>: Service {
    type Output: Returns;

    fn into_multi_func(self) -> Func;
}

/// A tuple of services returned by a multi-output function.
pub trait Returns: 'static {
    fn types() -> Vec<Type>;
    fn into_values(self) -> Vec<Value>;
}

macro_rules! impl_returns {
    ($($type_name:ident),*) => {
        impl<$($type_name: Service),*> Returns for ($($type_name,)*) {
            fn types() -> Vec<Type> {
                vec![$(Type::of::<$type_name>()),*]
            }

            #[allow(non_snake_case)]
            fn into_values(self) -> Vec<Value> {
                let ($($type_name,)*) = self;
                vec![$(Value::from_service($type_name)),*]
            }
        }
    };
}

impl_returns!(A, B);
impl_returns!(A, B, C);
impl_returns!(A, B, C, D);

macro_rules! impl_into_func {
    () => {
        impl_into_func!(@impl ());
    };
    ($first:ident $(, $rest:ident)*) => {
        impl_into_func!(@impl ($first $(, $rest)*));
        impl_into_func!($($rest),*);
    };
    (@args $func:ident, $args:ident, ($($type_name:ident),*)) => {
        {
            let mut position = 0_usize;
            $func($({
                let value = $crate::Valuer::Param(position).call($args)?;
                position += 1;
                <$type_name as Request>::from_value(value)?
            }),*)
        }
    };
    (@impl ($($type_name:ident),*)) => {
        impl<F, R $(, $type_name)*> IntoFunc<($($type_name,)*)> for F
        where
            F: Service + Fn($($type_name),*) -> R,
            R: Service,
            $($type_name: Request,)*
        {
            type Output = R;

            #[allow(unused_variables, unused_mut, unused_assignments, non_snake_case)]
            fn into_func(self) -> Func {
                let func = self;
                Func::new(
                    std::any::type_name::<F>(),
                    vec![$(<$type_name as Request>::requirement()),*],
                    vec![Type::of::<R>()],
                    move |args| {
                        let result = impl_into_func!(@args func, args, ($($type_name),*));
                        Ok(vec![Value::from_service(result)])
                    },
                )
            }
        }

        impl<F, R, E $(, $type_name)*> IntoFallibleFunc<($($type_name,)*)> for F
        where
            F: Service + Fn($($type_name),*) -> Result<R, E>,
            R: Service,
            E: Into<BoxError> + 'static,
            $($type_name: Request,)*
        {
            type Output = R;

            #[allow(unused_variables, unused_mut, unused_assignments, non_snake_case)]
            fn into_fallible_func(self) -> Func {
                let func = self;
                let name = std::any::type_name::<F>();
                Func::new(
                    name,
                    vec![$(<$type_name as Request>::requirement()),*],
                    vec![Type::of::<R>(), Type::error()],
                    move |args| {
                        match impl_into_func!(@args func, args, ($($type_name),*)) {
                            Ok(result) => Ok(vec![Value::from_service(result)]),
                            Err(error) => Err(InjectError::FunctionFailed {
                                function: name.to_owned(),
                                inner: error.into(),
                            }),
                        }
                    },
                )
            }
        }

        impl<F, R $(, $type_name)*> IntoMultiFunc<($($type_name,)*)> for F
        where
            F: Service + Fn($($type_name),*) -> R,
            R: Returns,
            $($type_name: Request,)*
        {
            type Output = R;

            #[allow(unused_variables, unused_mut, unused_assignments, non_snake_case)]
            fn into_multi_func(self) -> Func {
                let func = self;
                Func::new(
                    std::any::type_name::<F>(),
                    vec![$(<$type_name as Request>::requirement()),*],
                    R::types(),
                    move |args| {
                        let result = impl_into_func!(@args func, args, ($($type_name),*));
                        Ok(result.into_values())
                    },
                )
            }
        }
    };
}

impl_into_func!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
