use crate::{DynSvc, InjectError, InjectResult, Interface, Service, Svc};
use std::{
    any::type_name,
    fmt::{Debug, Formatter},
};

/// A type-erased value flowing through the engine.
#[derive(Clone)]
pub enum Value {
    /// A single service instance.
    Service(DynSvc),
    /// The values resolved for a collector, in resolution order.
    Seq(Vec<Value>),
    /// The non-error outputs of a function, in declaration order.
    Tuple(Vec<Value>),
    /// Named field values used to build an injectable struct.
    Record(Vec<(String, Value)>),
    /// The value of a dependency which was not resolved.
    Zero,
}

impl Value {
    /// Wraps a service instance.
    #[must_use]
    pub fn from_service<T: Service>(service: T) -> Self {
        Value::Service(Svc::new(service))
    }

    /// Wraps an existing service pointer.
    #[must_use]
    pub fn from_svc<T: Service>(service: Svc<T>) -> Self {
        Value::Service(service)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Value::Zero)
    }

    /// Narrows this value to a service of the given interface.
    pub fn downcast<I: ?Sized + Interface>(&self) -> InjectResult<Svc<I>> {
        match self {
            Value::Service(service) => I::downcast(service.clone()).ok_or_else(
                || InjectError::TypeMismatch {
                    expected: type_name::<I>().to_owned(),
                    found: self.describe(),
                },
            ),
            _ => Err(InjectError::TypeMismatch {
                expected: type_name::<I>().to_owned(),
                found: self.describe(),
            }),
        }
    }

    /// Gets the value of a named field of a record. Absent fields are zero.
    #[must_use]
    pub fn field(&self, name: &str) -> Value {
        match self {
            Value::Record(fields) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map_or(Value::Zero, |(_, value)| value.clone()),
            _ => Value::Zero,
        }
    }

    /// Splits a tuple or sequence into its items. Any other value is a
    /// single item, except zero which has none.
    #[must_use]
    pub fn spread(self) -> Vec<Value> {
        match self {
            Value::Tuple(items) | Value::Seq(items) => items,
            Value::Zero => Vec::new(),
            value => vec![value],
        }
    }

    /// A short description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Value::Service(_) => "a service".to_owned(),
            Value::Seq(items) => format!("a sequence of {} values", items.len()),
            Value::Tuple(items) => format!("a tuple of {} values", items.len()),
            Value::Record(fields) => format!("a record of {} fields", fields.len()),
            Value::Zero => "nothing".to_owned(),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Service(service) => {
                write!(f, "Service({:p})", Svc::as_ptr(service).cast::<()>())
            }
            Value::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Value::Tuple(items) => f.debug_tuple("Tuple").field(items).finish(),
            Value::Record(fields) => {
                let mut record = f.debug_struct("Record");
                for (name, value) in fields {
                    record.field(name, value);
                }
                record.finish()
            }
            Value::Zero => f.write_str("Zero"),
        }
    }
}

/// Services compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Service(a), Value::Service(b)) => {
                Svc::as_ptr(a).cast::<()>() == Svc::as_ptr(b).cast::<()>()
            }
            (Value::Seq(a), Value::Seq(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a == b
            }
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Zero, Value::Zero) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Value;
    use crate::InjectError;

    #[test]
    fn downcast_narrows_services() {
        let value = Value::from_service(42_i32);
        assert_eq!(42, *value.downcast::<i32>().unwrap());

        match value.downcast::<String>() {
            Err(InjectError::TypeMismatch { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(Value::Zero.downcast::<i32>().is_err());
    }

    #[test]
    fn services_compare_by_identity() {
        let value = Value::from_service(1_i32);
        assert_eq!(value, value.clone());
        assert_ne!(value, Value::from_service(1_i32));
    }

    #[test]
    fn records_default_missing_fields_to_zero() {
        let record =
            Value::Record(vec![("a".to_owned(), Value::from_service(1_u8))]);
        assert!(!record.field("a").is_zero());
        assert!(record.field("b").is_zero());
        assert!(Value::Zero.field("a").is_zero());
    }
}
