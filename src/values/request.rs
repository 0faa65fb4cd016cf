use crate::{InjectError, InjectResult, Interface, Svc, Type, Value};
use std::any::type_name;

/// What a parameter or field asks of the container before any qualifiers are
/// applied.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Requirement {
    ty: Type,
    optional: bool,
    collector: bool,
}

impl Requirement {
    /// A required, exclusive dependency on the given type.
    #[must_use]
    pub fn of(ty: Type) -> Self {
        Requirement {
            ty,
            optional: false,
            collector: false,
        }
    }

    #[must_use]
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    #[must_use]
    pub fn with_collector(mut self, collector: bool) -> Self {
        self.collector = collector;
        self
    }

    /// The declared type. For collectors, this is a sequence type.
    #[must_use]
    pub fn ty(&self) -> Type {
        self.ty
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    #[must_use]
    pub fn is_collector(&self) -> bool {
        self.collector
    }
}

/// A type which can be requested from the container, either as a parameter
/// of a function, a field of an injectable struct, or directly.
///
/// - `Svc<I>`: requests exactly one component of type `I`.
/// - `Option<Svc<I>>`: requests an optional component of type `I`. If none
///   matches, `None` is produced.
/// - `Vec<Svc<I>>`: requests every matching component of type `I`.
pub trait Request: Sized + 'static {
    /// The dependency this request declares by default.
    fn requirement() -> Requirement;

    /// Narrows a resolved value to this request.
    fn from_value(value: Value) -> InjectResult<Self>;
}

impl<I: ?Sized + Interface> Request for Svc<I> {
    fn requirement() -> Requirement {
        Requirement::of(Type::of::<I>())
    }

    fn from_value(value: Value) -> InjectResult<Self> {
        value.downcast::<I>()
    }
}

impl<I: ?Sized + Interface> Request for Option<Svc<I>> {
    fn requirement() -> Requirement {
        Requirement::of(Type::of::<I>()).with_optional(true)
    }

    fn from_value(value: Value) -> InjectResult<Self> {
        match value {
            Value::Zero => Ok(None),
            value => value.downcast::<I>().map(Some),
        }
    }
}

impl<I: ?Sized + Interface> Request for Vec<Svc<I>> {
    fn requirement() -> Requirement {
        Requirement::of(Type::seq::<I>()).with_collector(true)
    }

    fn from_value(value: Value) -> InjectResult<Self> {
        match value {
            Value::Seq(items) => {
                items.iter().map(Value::downcast::<I>).collect()
            }
            Value::Zero => Ok(Vec::new()),
            // A whole sequence provided as a single component
            Value::Service(service) => service
                .downcast::<Vec<Svc<I>>>()
                .map(|items| items.as_ref().clone())
                .map_err(|_| InjectError::TypeMismatch {
                    expected: type_name::<Self>().to_owned(),
                    found: "a service".to_owned(),
                }),
            value => Err(InjectError::TypeMismatch {
                expected: type_name::<Self>().to_owned(),
                found: value.describe(),
            }),
        }
    }
}
