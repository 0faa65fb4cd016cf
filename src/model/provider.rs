use crate::{
    Component, ComponentBuilder, ComponentData, ComponentOption, Consumer,
    ConsumerKind, DependencyBuilder, DynSvc, Func, FuncParams, Injectable,
    Interface, IntoFallibleFunc, IntoFunc, IntoMultiFunc, Issue, Item,
    Problem, Scope, Service, SourceLocation, StructFields, Svc, Symbol, Type,
    Value, Valuer,
};
use std::fmt::{Debug, Display, Formatter};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum ProviderKind {
    Value,
    Func,
    Struct,
}

#[derive(Debug)]
pub(crate) struct ProviderData {
    pub(crate) consumer: Consumer,
    pub(crate) kind: ProviderKind,
    pub(crate) components: Vec<ComponentData>,
    pub(crate) fake_outputs: Vec<usize>,
}

/// A consumer which also emits components. Providers are immutable once
/// built and cheap to clone.
///
/// ```
/// use runtime_resolver::{ComponentBuilder, Provider, Svc};
///
/// let answer = Provider::value(42_i32).name("answer").build();
/// assert_eq!(Some("answer"), answer.components()[0].name());
///
/// let doubled = Provider::func(|x: Svc<i32>| *x * 2)
///     .output(0, ComponentBuilder::new().name("doubled"))
///     .build();
/// assert_eq!(1, doubled.consumer().dependencies().len());
/// ```
#[derive(Clone)]
pub struct Provider(Svc<ProviderData>);

impl Provider {
    /// Provides a constant.
    #[track_caller]
    pub fn value<T: Service>(value: T) -> ValueProviderBuilder {
        ValueProviderBuilder::new(Value::from_service(value), Type::of::<T>())
    }

    /// Provides a type-erased constant of the given type.
    #[track_caller]
    pub fn value_dyn(value: DynSvc, ty: Type) -> ValueProviderBuilder {
        ValueProviderBuilder::new(Value::Service(value), ty)
    }

    /// Provides the result of a function.
    #[track_caller]
    pub fn func<D, F: IntoFunc<D>>(func: F) -> FuncProviderBuilder {
        Provider::from_func(Func::of(func))
    }

    /// Provides the success value of a function returning a `Result`.
    #[track_caller]
    pub fn fallible<D, F: IntoFallibleFunc<D>>(func: F) -> FuncProviderBuilder {
        Provider::from_func(Func::fallible(func))
    }

    /// Provides each value of the tuple returned by a function.
    #[track_caller]
    pub fn multi<D, F: IntoMultiFunc<D>>(func: F) -> FuncProviderBuilder {
        Provider::from_func(Func::multi(func))
    }

    /// Provides the results of an already reflected function.
    #[track_caller]
    pub fn from_func(func: Func) -> FuncProviderBuilder {
        FuncProviderBuilder {
            params: FuncParams::new(func),
            outputs: Vec::new(),
            scope: Scope::global(),
            location: SourceLocation::caller(),
        }
    }

    /// Provides an injectable struct built from its resolved fields.
    #[track_caller]
    pub fn structure<T: Injectable>() -> StructProviderBuilder {
        StructProviderBuilder {
            fields: StructFields::new(T::describe()),
            component: ComponentBuilder::new(),
            scope: Scope::global(),
            location: SourceLocation::caller(),
        }
    }

    fn publish(
        consumer: Consumer,
        kind: ProviderKind,
        components: Vec<ComponentData>,
        fake_outputs: Vec<usize>,
    ) -> Self {
        Provider(Svc::new(ProviderData {
            consumer,
            kind,
            components,
            fake_outputs,
        }))
    }

    /// A copy of this provider with a fresh identity, optionally moved to
    /// another scope.
    #[must_use]
    pub fn republish(&self, scope: Option<Scope>) -> Self {
        Provider::publish(
            self.0.consumer.republish(scope),
            self.0.kind,
            self.0.components.clone(),
            self.0.fake_outputs.clone(),
        )
    }

    pub(crate) fn data(&self) -> &ProviderData {
        &self.0
    }

    /// The identity of this provider, shared with its consumer.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.consumer.id()
    }

    /// The consumer side of this provider.
    #[must_use]
    pub fn consumer(&self) -> &Consumer {
        &self.0.consumer
    }

    /// The scope this provider's values live in.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        self.0.consumer.scope()
    }

    #[must_use]
    pub fn location(&self) -> SourceLocation {
        self.0.consumer.location()
    }

    /// The components in declared order.
    #[must_use]
    pub fn components(&self) -> Vec<Component> {
        (0..self.0.components.len())
            .map(|index| Component::new(self.clone(), index))
            .collect()
    }

    /// How the provider's value is produced from its dependencies.
    #[must_use]
    pub fn valuer(&self) -> Valuer {
        self.0.consumer.valuer()
    }

    /// Checks the provider, its dependencies and its components.
    #[must_use]
    pub fn validate(&self) -> Vec<Issue> {
        let mut issues = self.0.consumer.validate();
        if self.0.kind == ProviderKind::Func {
            let count = self.0.components.len();
            if count == 0 {
                issues.push(Issue::new(Item::Provider, Problem::NoOutputs));
            }
            for &index in &self.0.fake_outputs {
                issues.push(Issue::new(
                    Item::Output(index),
                    Problem::FakeOutput { index, count },
                ));
            }
        }

        for (index, component) in self.0.components.iter().enumerate() {
            component.validate(index, &mut issues);
        }

        issues
    }
}

impl PartialEq for Provider {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Provider {}

impl Debug for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Provider({}#{})", self, self.id())
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0.consumer, f)
    }
}

/// Adds component options which forward to the builder's single component.
macro_rules! component_options {
    ($builder:ty) => {
        impl $builder {
            #[must_use]
            pub fn name(mut self, name: impl Into<String>) -> Self {
                self.component = self.component.name(name);
                self
            }

            #[must_use]
            pub fn tag(mut self, tag: Symbol) -> Self {
                self.component = self.component.tag(tag);
                self
            }

            #[must_use]
            pub fn tags(mut self, tags: impl IntoIterator<Item = Symbol>) -> Self {
                self.component = self.component.tags(tags);
                self
            }

            /// Lets the component also match requests for the interface `I`.
            #[must_use]
            pub fn alias<I: ?Sized + Interface>(mut self) -> Self {
                self.component = self.component.alias::<I>();
                self
            }

            #[must_use]
            pub fn as_type(mut self, ty: Type) -> Self {
                self.component = self.component.as_type(ty);
                self
            }

            #[must_use]
            pub fn ignore(mut self) -> Self {
                self.component = self.component.ignore();
                self
            }

            #[must_use]
            pub fn hide(mut self) -> Self {
                self.component = self.component.hide();
                self
            }

            #[must_use]
            pub fn apply(
                mut self,
                option: impl Into<Option<ComponentOption>>,
            ) -> Self {
                self.component = self.component.apply(option);
                self
            }
        }
    };
}

/// Adds the scope and location options every provider builder has.
macro_rules! provider_options {
    ($builder:ty) => {
        impl $builder {
            /// Places the provider in a scope. Its values are memoised in
            /// that scope and are only visible to consumers within it.
            #[must_use]
            pub fn in_scope(mut self, scope: Scope) -> Self {
                self.scope = scope;
                self
            }

            #[must_use]
            pub fn location(mut self, location: SourceLocation) -> Self {
                self.location = location;
                self
            }

            /// Replaces the recorded location with the caller's.
            #[must_use]
            #[track_caller]
            pub fn update_call_location(self) -> Self {
                self.location(SourceLocation::caller())
            }
        }
    };
}

/// Builds a provider of a constant.
#[derive(Clone, Debug)]
pub struct ValueProviderBuilder {
    value: Value,
    ty: Type,
    component: ComponentBuilder,
    scope: Scope,
    location: SourceLocation,
}

impl ValueProviderBuilder {
    #[track_caller]
    fn new(value: Value, ty: Type) -> Self {
        ValueProviderBuilder {
            value,
            ty,
            component: ComponentBuilder::new(),
            scope: Scope::global(),
            location: SourceLocation::caller(),
        }
    }

    #[must_use]
    pub fn build(&self) -> Provider {
        let kind = ConsumerKind::Constant {
            value: self.value.clone(),
            ty: self.ty,
        };
        let consumer =
            Consumer::publish(kind, Vec::new(), self.scope.clone(), self.location);
        let component = self.component.build(self.ty, Valuer::Identity);
        Provider::publish(consumer, ProviderKind::Value, vec![component], Vec::new())
    }
}

component_options!(ValueProviderBuilder);
provider_options!(ValueProviderBuilder);

/// Builds a provider of the outputs of a function.
#[derive(Clone, Debug)]
pub struct FuncProviderBuilder {
    params: FuncParams,
    outputs: Vec<(usize, ComponentBuilder)>,
    scope: Scope,
    location: SourceLocation,
}

impl FuncProviderBuilder {
    /// Qualifies the parameter at `index`. Indexes past the function's arity
    /// are kept and reported when the provider is validated.
    #[must_use]
    pub fn param(mut self, index: usize, dependency: DependencyBuilder) -> Self {
        self.params.set(index, dependency);
        self
    }

    /// Configures the component for the non-error output at `index`. Indexes
    /// past the function's outputs are kept and reported when the provider
    /// is validated.
    #[must_use]
    pub fn output(mut self, index: usize, component: ComponentBuilder) -> Self {
        match self.outputs.iter_mut().find(|(output, _)| *output == index) {
            Some((_, existing)) => *existing = component,
            None => self.outputs.push((index, component)),
        }
        self
    }

    #[must_use]
    pub fn func(&self) -> &Func {
        self.params.func()
    }

    #[must_use]
    pub fn build(&self) -> Provider {
        let (kind, dependencies) = self.params.build();
        let consumer =
            Consumer::publish(kind, dependencies, self.scope.clone(), self.location);

        let default = ComponentBuilder::new();
        let results: Vec<Type> = self.params.func().results().collect();
        let components = results
            .iter()
            .enumerate()
            .map(|(index, ty)| {
                self.outputs
                    .iter()
                    .find(|(output, _)| *output == index)
                    .map_or(&default, |(_, component)| component)
                    .build(*ty, Valuer::Index(index))
            })
            .collect();
        let fake_outputs = self
            .outputs
            .iter()
            .map(|(index, _)| *index)
            .filter(|index| *index >= results.len())
            .collect();

        Provider::publish(consumer, ProviderKind::Func, components, fake_outputs)
    }
}

provider_options!(FuncProviderBuilder);

/// Builds a provider of an injectable struct.
#[derive(Clone, Debug)]
pub struct StructProviderBuilder {
    fields: StructFields,
    component: ComponentBuilder,
    scope: Scope,
    location: SourceLocation,
}

impl StructProviderBuilder {
    /// Qualifies a field. Names which are not fields of the struct are kept
    /// and reported when the provider is validated.
    #[must_use]
    pub fn field(
        mut self,
        name: impl Into<String>,
        dependency: DependencyBuilder,
    ) -> Self {
        self.fields.set(name.into(), dependency);
        self
    }

    /// Leaves out every field for which `filter` returns `true`.
    #[must_use]
    pub fn ignore_fields(
        mut self,
        filter: impl Fn(&str) -> bool + Service,
    ) -> Self {
        self.fields.ignore(Svc::new(filter));
        self
    }

    #[must_use]
    pub fn build(&self) -> Provider {
        let (kind, dependencies) = self.fields.build();
        let consumer =
            Consumer::publish(kind, dependencies, self.scope.clone(), self.location);
        let component =
            self.component.build(self.fields.info().ty(), Valuer::Identity);
        Provider::publish(consumer, ProviderKind::Struct, vec![component], Vec::new())
    }
}

component_options!(StructProviderBuilder);
provider_options!(StructProviderBuilder);

/// Any provider builder, or an already built provider to be copied.
#[derive(Clone, Debug)]
pub enum ProviderBuilder {
    Value(ValueProviderBuilder),
    Func(FuncProviderBuilder),
    Struct(StructProviderBuilder),
    Published {
        provider: Provider,
        scope: Option<Scope>,
    },
}

impl ProviderBuilder {
    #[must_use]
    pub fn in_scope(self, scope: Scope) -> Self {
        match self {
            ProviderBuilder::Value(builder) => {
                ProviderBuilder::Value(builder.in_scope(scope))
            }
            ProviderBuilder::Func(builder) => {
                ProviderBuilder::Func(builder.in_scope(scope))
            }
            ProviderBuilder::Struct(builder) => {
                ProviderBuilder::Struct(builder.in_scope(scope))
            }
            ProviderBuilder::Published { provider, .. } => {
                ProviderBuilder::Published {
                    provider,
                    scope: Some(scope),
                }
            }
        }
    }

    /// Publishes a new provider with a fresh identity.
    #[must_use]
    pub fn build(&self) -> Provider {
        match self {
            ProviderBuilder::Value(builder) => builder.build(),
            ProviderBuilder::Func(builder) => builder.build(),
            ProviderBuilder::Struct(builder) => builder.build(),
            ProviderBuilder::Published { provider, scope } => {
                provider.republish(scope.clone())
            }
        }
    }
}

impl From<ValueProviderBuilder> for ProviderBuilder {
    fn from(builder: ValueProviderBuilder) -> Self {
        ProviderBuilder::Value(builder)
    }
}

impl From<FuncProviderBuilder> for ProviderBuilder {
    fn from(builder: FuncProviderBuilder) -> Self {
        ProviderBuilder::Func(builder)
    }
}

impl From<StructProviderBuilder> for ProviderBuilder {
    fn from(builder: StructProviderBuilder) -> Self {
        ProviderBuilder::Struct(builder)
    }
}

impl From<Provider> for ProviderBuilder {
    fn from(provider: Provider) -> Self {
        ProviderBuilder::Published {
            provider,
            scope: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ComponentBuilder, DependencyBuilder, Item, Problem, Provider, Scope,
        Svc, Type, Valuer,
    };

    fn split(text: Svc<String>) -> (usize, bool) {
        (text.len(), text.is_empty())
    }

    #[test]
    fn value_providers_have_one_identity_component() {
        let provider = Provider::value("x".to_owned()).build();
        assert!(provider.consumer().dependencies().is_empty());
        assert!(matches!(provider.valuer(), Valuer::Const(_)));

        let components = provider.components();
        assert_eq!(1, components.len());
        assert_eq!(Type::of::<String>(), components[0].ty());
        assert_eq!(&Valuer::Identity, components[0].valuer());
        assert!(provider.validate().is_empty());
    }

    #[test]
    fn func_outputs_are_indexed() {
        let provider = Provider::multi(split)
            .output(1, ComponentBuilder::new().name("empty"))
            .build();

        let components = provider.components();
        assert_eq!(2, components.len());
        assert_eq!(&Valuer::Index(1), components[1].valuer());
        assert_eq!(Some("empty"), components[1].name());
        assert_eq!(Type::of::<bool>(), components[1].ty());
    }

    #[test]
    fn fallible_funcs_skip_the_error_slot() {
        let provider = Provider::fallible(|| "1".parse::<u32>()).build();
        let components = provider.components();
        assert_eq!(1, components.len());
        assert_eq!(Type::of::<u32>(), components[0].ty());
    }

    #[test]
    fn fake_outputs_and_params_are_reported() {
        let provider = Provider::func(|x: Svc<u8>| *x)
            .param(3, DependencyBuilder::new())
            .output(2, ComponentBuilder::new())
            .build();

        let issues = provider.validate();
        assert_eq!(2, issues.len());
        assert_eq!(&Item::Output(2), issues[1].item());
        assert_eq!(&Problem::FakeOutput { index: 2, count: 1 }, issues[1].problem());
    }

    #[test]
    fn mistyped_values_are_reported() {
        let provider =
            Provider::value_dyn(Svc::new(1_u8), Type::of::<u16>()).build();
        let issues = provider.validate();
        assert_eq!(1, issues.len());
        assert_eq!(
            &Problem::ValueTypeMismatch {
                ty: Type::of::<u16>()
            },
            issues[0].problem()
        );
    }

    #[test]
    fn republishing_keeps_attributes_under_a_new_identity() {
        let scope = Scope::new("request");
        let provider = Provider::value(1_i32).name("one").build();
        let copy = provider.republish(Some(scope.clone()));

        assert_ne!(provider, copy);
        assert_eq!(&scope, copy.scope());
        assert_eq!(Some("one"), copy.components()[0].name());
        assert_eq!(provider.location(), copy.location());
    }
}
