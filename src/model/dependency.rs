use crate::{
    Consumer, Criteria, Issue, Item, Problem, Requirement, Symbol, SymbolSet,
    Type, Valuer,
};
use std::{
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
};

/// Where a dependency threads its value into its consumer.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Slot {
    /// A positional function parameter.
    Param(usize),
    /// A named struct field.
    Field(String),
    /// The single dependency of a value request.
    Value,
    /// One of the criteria of a criteria request.
    Criteria(usize),
    /// The collector of a load-all request.
    All,
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Param(index) => write!(f, "parameter {}", index),
            Slot::Field(name) => write!(f, "field `{}`", name),
            Slot::Value => f.write_str("value"),
            Slot::Criteria(index) => write!(f, "criteria {}", index),
            Slot::All => f.write_str("all components"),
        }
    }
}

/// A qualifier for a dependency which can be passed around as a value.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DependencyOption {
    ByName(String),
    ByTags(Vec<Symbol>),
    Optional(bool),
    AsCollector(bool),
}

/// Qualifiers applied to a parameter, field or value request. Anything not
/// set falls back to what the requested type declares: `Option<Svc<T>>` is
/// optional and `Vec<Svc<T>>` is a collector.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct DependencyBuilder {
    name: Option<String>,
    tags: SymbolSet,
    optional: Option<bool>,
    collector: Option<bool>,
}

impl DependencyBuilder {
    #[must_use]
    pub fn new() -> Self {
        DependencyBuilder::default()
    }

    /// Only matches components with the given name.
    #[must_use]
    pub fn by_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Only matches components carrying every given tag.
    #[must_use]
    pub fn by_tags(mut self, tags: impl IntoIterator<Item = Symbol>) -> Self {
        self.tags.extend(tags);
        self
    }

    #[must_use]
    pub fn by_tag(mut self, tag: Symbol) -> Self {
        self.tags.insert(tag);
        self
    }

    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    /// Collects every matching component. The requested type must be a
    /// sequence.
    #[must_use]
    pub fn as_collector(mut self, collector: bool) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Applies an option. `None` is ignored.
    #[must_use]
    pub fn apply(self, option: impl Into<Option<DependencyOption>>) -> Self {
        match option.into() {
            Some(DependencyOption::ByName(name)) => self.by_name(name),
            Some(DependencyOption::ByTags(tags)) => self.by_tags(tags),
            Some(DependencyOption::Optional(optional)) => self.optional(optional),
            Some(DependencyOption::AsCollector(collector)) => {
                self.as_collector(collector)
            }
            None => self,
        }
    }

    pub(crate) fn build(
        &self,
        slot: Slot,
        requirement: Requirement,
    ) -> DependencyData {
        DependencyData {
            slot,
            ty: requirement.ty(),
            name: self.name.clone(),
            tags: self.tags.clone(),
            optional: self.optional.unwrap_or_else(|| requirement.is_optional()),
            collector: self
                .collector
                .unwrap_or_else(|| requirement.is_collector()),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub(crate) struct DependencyData {
    pub(crate) slot: Slot,
    pub(crate) ty: Type,
    pub(crate) name: Option<String>,
    pub(crate) tags: SymbolSet,
    pub(crate) optional: bool,
    pub(crate) collector: bool,
}

impl DependencyData {
    /// The type components must have. Collectors match their element type.
    pub(crate) fn effective_type(&self) -> Type {
        if self.collector {
            self.ty.elem().unwrap_or(self.ty)
        } else {
            self.ty
        }
    }

    pub(crate) fn validate(&self, issues: &mut Vec<Issue>) {
        let item = || Item::Dependency(self.slot.clone());
        if self.ty.is_error() {
            issues.push(Issue::new(item(), Problem::ErrorType));
        }
        if self.collector && !self.ty.is_sequence() && !self.ty.is_wildcard() {
            issues.push(Issue::new(
                item(),
                Problem::CollectorNotSequence { ty: self.ty },
            ));
        }
    }
}

/// A requirement of a consumer. Handles are only valid together with the
/// consumer they were obtained from, which they keep alive.
#[derive(Clone)]
pub struct Dependency {
    consumer: Consumer,
    index: usize,
}

impl Dependency {
    pub(crate) fn new(consumer: Consumer, index: usize) -> Self {
        Dependency { consumer, index }
    }

    fn data(&self) -> &DependencyData {
        &self.consumer.data().dependencies[self.index]
    }

    #[must_use]
    pub fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    /// The position of this dependency among its consumer's dependencies.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn slot(&self) -> &Slot {
        &self.data().slot
    }

    /// The type as declared. For collectors, this is a sequence type.
    #[must_use]
    pub fn declared_type(&self) -> Type {
        self.data().ty
    }

    /// The type components must have to match this dependency.
    #[must_use]
    pub fn ty(&self) -> Type {
        self.data().effective_type()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.data().name.as_deref()
    }

    #[must_use]
    pub fn tags(&self) -> &SymbolSet {
        &self.data().tags
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.data().optional
    }

    #[must_use]
    pub fn is_collector(&self) -> bool {
        self.data().collector
    }

    /// The criteria matched against components.
    #[must_use]
    pub fn criteria(&self) -> Criteria {
        let data = self.data();
        Criteria::from_parts(
            data.effective_type(),
            data.name.clone(),
            data.tags.clone(),
        )
    }

    /// How resolved component values are threaded into the consumer.
    #[must_use]
    pub fn valuer(&self) -> Valuer {
        if self.is_collector() {
            Valuer::Collector(self.ty())
        } else {
            Valuer::Identity
        }
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.consumer.id() == other.consumer.id() && self.index == other.index
    }
}

impl Eq for Dependency {}

impl Hash for Dependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.consumer.id().hash(state);
        self.index.hash(state);
    }
}

impl Debug for Dependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Dependency({} of {})", self.slot(), self.consumer)
    }
}

impl Display for Dependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {} ({})", self.slot(), self.consumer, self.criteria())
    }
}
