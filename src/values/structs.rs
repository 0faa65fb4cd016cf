use crate::{DynBuild, DynSvc, InjectResult, Requirement, Service, Svc, Type, Value};
use std::fmt::{Debug, Formatter};

/// A field of an injectable struct.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FieldInfo {
    name: &'static str,
    requirement: Requirement,
}

impl FieldInfo {
    #[must_use]
    pub fn new(name: &'static str, requirement: Requirement) -> Self {
        FieldInfo { name, requirement }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn requirement(&self) -> Requirement {
        self.requirement
    }
}

/// Reflection over an injectable struct: its fields in declaration order and
/// a way to build an instance from a record of field values.
#[derive(Clone)]
pub struct StructInfo {
    ty: Type,
    fields: Vec<FieldInfo>,
    build: Svc<DynBuild>,
}

impl StructInfo {
    /// Describes the struct `T`. `build` receives a [`Value::Record`] keyed by
    /// field name. Fields which were not resolved are absent from the record.
    #[must_use]
    pub fn new<T: Service>(
        fields: Vec<FieldInfo>,
        build: fn(&Value) -> InjectResult<T>,
    ) -> Self {
        StructInfo {
            ty: Type::structure::<T>(),
            fields,
            build: Svc::new(move |record: &Value| {
                build(record).map(|instance| Svc::new(instance) as DynSvc)
            }),
        }
    }

    #[must_use]
    pub fn ty(&self) -> Type {
        self.ty
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub(crate) fn build(&self, record: &Value) -> InjectResult<DynSvc> {
        (self.build)(record)
    }
}

impl PartialEq for StructInfo {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.fields == other.fields
    }
}

impl Debug for StructInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructInfo")
            .field("ty", &self.ty)
            .field("fields", &self.fields)
            .finish()
    }
}

/// A struct whose fields can be resolved by the container. This should
/// usually be implemented with the [`injectable!`] macro.
pub trait Injectable: Service + Sized {
    fn describe() -> StructInfo;
}

/// Declares a struct whose fields are all [`Request`](crate::Request)s and
/// implements [`Injectable`] for it.
///
/// ```
/// use runtime_resolver::{injectable, Injectable, Svc};
///
/// injectable! {
///     pub struct Greeter {
///         pub name: Svc<String>,
///         pub punctuation: Option<Svc<char>>,
///     }
/// }
///
/// let info = Greeter::describe();
/// assert_eq!(2, info.fields().len());
/// assert_eq!("punctuation", info.fields()[1].name());
/// ```
#[macro_export]
macro_rules! injectable {
    {
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_attr:meta])*
                $field_vis:vis $field:ident : $field_ty:ty
            ),*
            $(,)?
        }
    } => {
        $(#[$attr])*
        $vis struct $name {
            $(
                $(#[$field_attr])*
                $field_vis $field: $field_ty,
            )*
        }

        impl $crate::Injectable for $name {
            fn describe() -> $crate::StructInfo {
                $crate::StructInfo::new::<Self>(
                    ::std::vec![$(
                        $crate::FieldInfo::new(
                            ::std::stringify!($field),
                            <$field_ty as $crate::Request>::requirement(),
                        )
                    ),*],
                    |record| {
                        ::std::result::Result::Ok($name {
                            $(
                                $field: <$field_ty as $crate::Request>::from_value(
                                    record.field(::std::stringify!($field)),
                                )?,
                            )*
                        })
                    },
                )
            }
        }
    };
}
