use crate::Svc;
use std::{
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Allocates a process-unique identity. Zero is never returned and is
/// reserved for the global scope.
pub(crate) fn next_identity() -> u64 {
    NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)
}

/// A named tag attached to components and required by dependencies. Each call
/// to [`Symbol::new()`] creates a distinct symbol, even if the names match.
///
/// ```
/// use runtime_resolver::Symbol;
///
/// let primary = Symbol::new("primary");
/// assert_eq!(primary, primary.clone());
/// assert_ne!(primary, Symbol::new("primary"));
/// ```
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    name: Svc<str>,
}

impl Symbol {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Symbol {
            id: next_identity(),
            name: Svc::from(name),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Symbol({}#{})", self.name, self.id)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
