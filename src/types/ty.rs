use crate::{Interface, Service, Svc};
use std::{
    any::{type_name, TypeId},
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
};

/// Marker behind [`Type::wildcard()`].
struct Wildcard;

/// Marker behind [`Type::error()`].
struct ErrorSlot;

#[derive(Clone, Copy, Debug)]
enum TypeKind {
    Concrete,
    Struct,
    Interface(fn(TypeId) -> bool),
    Sequence(fn() -> Type),
    Error,
    Wildcard,
}

/// A handle identifying the type of a value known to the container.
///
/// Two handles are equal when they refer to the same Rust type, regardless of
/// how they were created. For example, [`Type::seq::<i32>()`](Type::seq) and
/// `Type::of::<Vec<Svc<i32>>>()` are equal, but only the former knows its
/// element type.
///
/// ```
/// use runtime_resolver::{Svc, Type};
///
/// assert_eq!(Type::of::<i32>(), Type::of::<i32>());
/// assert_ne!(Type::of::<i32>(), Type::of::<u32>());
/// assert_eq!(Type::seq::<i32>(), Type::of::<Vec<Svc<i32>>>());
/// assert_eq!(Some(Type::of::<i32>()), Type::seq::<i32>().elem());
/// ```
#[derive(Clone, Copy)]
pub struct Type {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
}

impl Type {
    /// Gets the type handle for a service type or a declared interface.
    #[must_use]
    pub fn of<T: ?Sized + Interface>() -> Self {
        let kind = if T::is_interface() {
            TypeKind::Interface(T::implemented_by)
        } else {
            TypeKind::Concrete
        };

        Type {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind,
        }
    }

    /// Gets the type handle for a sequence of services of type `T`. Sequence
    /// types are the only declared types a collector dependency accepts.
    #[must_use]
    pub fn seq<T: ?Sized + Interface>() -> Self {
        Type {
            id: TypeId::of::<Vec<Svc<T>>>(),
            name: type_name::<Vec<Svc<T>>>(),
            kind: TypeKind::Sequence(Type::of::<T>),
        }
    }

    /// Gets the type handle for an injectable struct.
    #[must_use]
    pub fn structure<T: Service>() -> Self {
        Type {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind: TypeKind::Struct,
        }
    }

    /// The sentinel type which matches every component in match-all lookups.
    #[must_use]
    pub fn wildcard() -> Self {
        Type {
            id: TypeId::of::<Wildcard>(),
            name: "*",
            kind: TypeKind::Wildcard,
        }
    }

    /// The type of the error slot of a fallible function. Components and
    /// dependencies can never have this type.
    #[must_use]
    pub fn error() -> Self {
        Type {
            id: TypeId::of::<ErrorSlot>(),
            name: "error",
            kind: TypeKind::Error,
        }
    }

    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface(_))
    }

    #[must_use]
    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct)
    }

    #[must_use]
    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, TypeKind::Sequence(_))
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.kind, TypeKind::Error)
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self.kind, TypeKind::Wildcard)
    }

    /// The element type, if this is a sequence type.
    #[must_use]
    pub fn elem(&self) -> Option<Type> {
        match self.kind {
            TypeKind::Sequence(elem) => Some(elem()),
            _ => None,
        }
    }

    /// Checks whether values of this type can be used as the given interface.
    /// Only interfaces declared with [`interface!`](crate::interface) are
    /// ever implemented.
    #[must_use]
    pub fn implements(&self, interface: &Type) -> bool {
        match interface.kind {
            TypeKind::Interface(implemented_by) => implemented_by(self.id),
            _ => false,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Type({})", self.name)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use crate::{interface, Service, Type};

    trait Shape: Service {}
    struct Square;
    struct Circle;
    impl Shape for Square {}
    impl Shape for Circle {}
    interface!(Shape = [Square]);

    #[test]
    fn identity_follows_rust_types() {
        assert_eq!(Type::of::<Square>(), Type::structure::<Square>());
        assert_ne!(Type::of::<Square>(), Type::of::<Circle>());
        assert_ne!(Type::wildcard(), Type::error());
        assert_eq!(Type::wildcard(), Type::wildcard());
    }

    #[test]
    fn interfaces_know_their_implementors() {
        let shape = Type::of::<dyn Shape>();
        assert!(shape.is_interface());
        assert!(!Type::of::<Square>().is_interface());
        assert!(Type::of::<Square>().implements(&shape));
        assert!(!Type::of::<Circle>().implements(&shape));
        assert!(!Type::of::<Square>().implements(&Type::of::<Circle>()));
    }

    #[test]
    fn sequences_expose_their_element() {
        let seq = Type::seq::<dyn Shape>();
        assert!(seq.is_sequence());
        assert_eq!(Some(Type::of::<dyn Shape>()), seq.elem());
        assert_eq!(None, Type::of::<Square>().elem());
    }
}
