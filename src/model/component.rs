use crate::{
    Criteria, Interface, Issue, Item, Problem, Provider, Scope, Symbol,
    SymbolSet, Type, TypeSet, Valuer,
};
use std::{
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
};

/// An option for a component which can be passed around as a value.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ComponentOption {
    Name(String),
    Tags(Vec<Symbol>),
    As(Vec<Type>),
    Ignore,
    Hide,
}

/// Attributes of a component emitted by a provider.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct ComponentBuilder {
    name: Option<String>,
    tags: SymbolSet,
    aliases: TypeSet,
    ignored: bool,
    hidden: bool,
}

impl ComponentBuilder {
    #[must_use]
    pub fn new() -> Self {
        ComponentBuilder::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: Symbol) -> Self {
        self.tags.insert(tag);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = Symbol>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Lets the component also match requests for the interface `I`. The
    /// component's type must be listed as an implementor of `I` in its
    /// [`interface!`](crate::interface) declaration.
    #[must_use]
    pub fn alias<I: ?Sized + Interface>(self) -> Self {
        self.as_type(Type::of::<I>())
    }

    #[must_use]
    pub fn as_type(mut self, ty: Type) -> Self {
        self.aliases.insert(ty);
        self
    }

    /// Leaves the component out of the repository entirely.
    #[must_use]
    pub fn ignore(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Only matches requests which ask for the component by name or tag.
    #[must_use]
    pub fn hide(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Applies an option. `None` is ignored.
    #[must_use]
    pub fn apply(self, option: impl Into<Option<ComponentOption>>) -> Self {
        match option.into() {
            Some(ComponentOption::Name(name)) => self.name(name),
            Some(ComponentOption::Tags(tags)) => self.tags(tags),
            Some(ComponentOption::As(types)) => {
                types.into_iter().fold(self, ComponentBuilder::as_type)
            }
            Some(ComponentOption::Ignore) => self.ignore(),
            Some(ComponentOption::Hide) => self.hide(),
            None => self,
        }
    }

    pub(crate) fn build(&self, ty: Type, valuer: Valuer) -> ComponentData {
        ComponentData {
            ty,
            name: self.name.clone(),
            tags: self.tags.clone(),
            aliases: self.aliases.clone(),
            ignored: self.ignored,
            hidden: self.hidden,
            valuer,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub(crate) struct ComponentData {
    pub(crate) ty: Type,
    pub(crate) name: Option<String>,
    pub(crate) tags: SymbolSet,
    pub(crate) aliases: TypeSet,
    pub(crate) ignored: bool,
    pub(crate) hidden: bool,
    pub(crate) valuer: Valuer,
}

impl ComponentData {
    pub(crate) fn validate(&self, index: usize, issues: &mut Vec<Issue>) {
        let mut report = |problem| issues.push(Issue::new(Item::Component(index), problem));
        if self.ty.is_error() {
            report(Problem::ErrorType);
        }
        if self.ty.is_wildcard() {
            report(Problem::WildcardType);
        }

        for alias in &self.aliases {
            if alias.is_error() {
                report(Problem::ErrorType);
            } else if !alias.is_interface() {
                report(Problem::AliasNotInterface { alias: *alias });
            } else if !self.ty.implements(alias) {
                report(Problem::AliasNotImplemented {
                    ty: self.ty,
                    alias: *alias,
                });
            }
        }
    }
}

/// A value a provider can produce. Handles keep their provider alive.
#[derive(Clone)]
pub struct Component {
    provider: Provider,
    index: usize,
}

impl Component {
    pub(crate) fn new(provider: Provider, index: usize) -> Self {
        Component { provider, index }
    }

    fn data(&self) -> &ComponentData {
        &self.provider.data().components[self.index]
    }

    #[must_use]
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// The position of this component among its provider's components.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn ty(&self) -> Type {
        self.data().ty
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.data().name.as_deref()
    }

    #[must_use]
    pub fn tags(&self) -> &SymbolSet {
        &self.data().tags
    }

    /// The interfaces this component can also be requested as.
    #[must_use]
    pub fn aliases(&self) -> &TypeSet {
        &self.data().aliases
    }

    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.data().ignored
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.data().hidden
    }

    /// The scope of the component's provider.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        self.provider.scope()
    }

    /// How the component's value is extracted from its provider's output.
    #[must_use]
    pub fn valuer(&self) -> &Valuer {
        &self.data().valuer
    }

    /// Checks whether this component satisfies the criteria.
    #[must_use]
    pub fn matches(&self, criteria: &Criteria) -> bool {
        let data = self.data();
        let ty = criteria.ty();
        if data.ty != ty && !data.aliases.has(&ty) {
            return false;
        }

        if let Some(name) = criteria.name() {
            if data.name.as_deref() != Some(name) {
                return false;
            }
        }

        if !criteria.tags().is_subset(&data.tags) {
            return false;
        }

        !data.hidden || criteria.has_qualifier()
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.provider.id() == other.provider.id() && self.index == other.index
    }
}

impl Eq for Component {}

impl Hash for Component {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider.id().hash(state);
        self.index.hash(state);
    }
}

impl Debug for Component {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Component({}#{})", self, self.provider.id())
    }
}

impl Display for Component {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ty())?;
        if let Some(name) = self.name() {
            write!(f, " {:?}", name)?;
        }

        write!(f, " from {}", self.provider)
    }
}
