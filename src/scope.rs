use crate::{next_identity, Svc};
use std::{
    collections::HashSet,
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
};

const GLOBAL_SCOPE_ID: u64 = 0;
const GLOBAL_SCOPE_NAME: &str = "global";

struct ScopeInner {
    id: u64,
    name: String,
    parents: Vec<Scope>,
}

/// A lifetime compartment for components. Scopes form a directed acyclic
/// graph rooted at the [global scope](Scope::global). A consumer can use
/// components provided in its own scope or in any ancestor scope, and a scope
/// can only be entered from one of its direct parents.
///
/// Since parents are fixed when a scope is created, cycles are impossible.
///
/// ```
/// use runtime_resolver::Scope;
///
/// let request = Scope::new("request");
/// let transaction = Scope::with_parents("transaction", [request.clone()]);
///
/// assert!(transaction.can_enter_from(&request));
/// assert!(transaction.can_enter_from(&Scope::global()));
/// assert!(!transaction.can_enter_directly_from(&Scope::global()));
/// assert!(!request.can_enter_from(&transaction));
/// ```
#[derive(Clone)]
pub struct Scope(Svc<ScopeInner>);

impl Scope {
    /// The root scope. Every handle returned by this function is equal to
    /// every other one.
    #[must_use]
    pub fn global() -> Self {
        Scope(Svc::new(ScopeInner {
            id: GLOBAL_SCOPE_ID,
            name: GLOBAL_SCOPE_NAME.to_owned(),
            parents: Vec::new(),
        }))
    }

    /// Creates a new scope whose only parent is the global scope.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Scope::with_parents(name, [Scope::global()])
    }

    /// Creates a new scope with the given parents. If no parents are given,
    /// the global scope is used as the parent. Duplicate parents are
    /// ignored.
    #[must_use]
    pub fn with_parents(
        name: impl Into<String>,
        parents: impl IntoIterator<Item = Scope>,
    ) -> Self {
        let mut unique = Vec::new();
        for parent in parents {
            if !unique.contains(&parent) {
                unique.push(parent);
            }
        }
        if unique.is_empty() {
            unique.push(Scope::global());
        }

        Scope(Svc::new(ScopeInner {
            id: next_identity(),
            name: name.into(),
            parents: unique,
        }))
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn parents(&self) -> &[Scope] {
        &self.0.parents
    }

    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0.id == GLOBAL_SCOPE_ID
    }

    /// Checks whether `other` is a transitive parent of this scope.
    #[must_use]
    pub fn can_enter_from(&self, other: &Scope) -> bool {
        let mut visited = HashSet::new();
        let mut pending: Vec<&Scope> = self.parents().iter().collect();
        while let Some(scope) = pending.pop() {
            if scope == other {
                return true;
            }

            if visited.insert(scope.id()) {
                pending.extend(scope.parents());
            }
        }

        false
    }

    /// Checks whether `other` is a direct parent of this scope.
    #[must_use]
    pub fn can_enter_directly_from(&self, other: &Scope) -> bool {
        self.parents().contains(other)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::global()
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Scope {}

impl Hash for Scope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl Debug for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Scope({}#{})", self.0.name, self.0.id)
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.name)
    }
}
