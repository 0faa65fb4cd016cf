use crate::{Symbol, SymbolSet, Type};
use std::fmt::{Display, Formatter};

/// A search pattern matched against components: a type plus an optional name
/// and a set of required tags.
///
/// ```
/// use runtime_resolver::{Criteria, Symbol, Type};
///
/// let primary = Symbol::new("primary");
/// let criteria = Criteria::of(Type::of::<i32>())
///     .named("answer")
///     .with_tag(primary);
///
/// assert!(criteria.has_qualifier());
/// assert!(Criteria::wildcard().is_match_all());
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Criteria {
    ty: Type,
    name: Option<String>,
    tags: SymbolSet,
}

impl Criteria {
    #[must_use]
    pub fn of(ty: Type) -> Self {
        Criteria {
            ty,
            name: None,
            tags: SymbolSet::new(),
        }
    }

    /// Matches every component.
    #[must_use]
    pub fn wildcard() -> Self {
        Criteria::of(Type::wildcard())
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn tagged(mut self, tags: impl IntoIterator<Item = Symbol>) -> Self {
        self.tags.extend(tags);
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: Symbol) -> Self {
        self.tags.insert(tag);
        self
    }

    pub(crate) fn from_parts(
        ty: Type,
        name: Option<String>,
        tags: SymbolSet,
    ) -> Self {
        Criteria { ty, name, tags }
    }

    #[must_use]
    pub fn ty(&self) -> Type {
        self.ty
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn tags(&self) -> &SymbolSet {
        &self.tags
    }

    /// Whether a name or any tag is required.
    #[must_use]
    pub fn has_qualifier(&self) -> bool {
        self.name.is_some() || !self.tags.is_empty()
    }

    /// Whether these criteria match every component.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.ty.is_wildcard() && !self.has_qualifier()
    }
}

impl Display for Criteria {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ty)?;
        if let Some(name) = &self.name {
            write!(f, " named {:?}", name)?;
        }
        if !self.tags.is_empty() {
            let tags: Vec<_> = self.tags.iter().map(Symbol::name).collect();
            write!(f, " tagged [{}]", tags.join(", "))?;
        }

        Ok(())
    }
}
