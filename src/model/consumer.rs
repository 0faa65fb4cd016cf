use crate::{
    next_identity, Criteria, Dependency, DependencyBuilder, DependencyData,
    DependencyOption, DynFieldFilter, Func, InjectResult, Injectable,
    IntoFunc, Issue, Item, Problem, Request, Requirement, Scope, Service,
    Slot, SourceLocation, StructInfo, Svc, Symbol, Type, Value, Valuer,
};
use std::{
    any::Any,
    fmt::{Debug, Display, Formatter},
    marker::PhantomData,
};

#[derive(Clone, Debug)]
pub(crate) enum ConsumerKind {
    Func {
        func: Func,
        fake_params: Vec<usize>,
    },
    Struct {
        info: StructInfo,
        ignored: Vec<String>,
        fake_fields: Vec<String>,
    },
    Value,
    LoadCriteria,
    LoadAll,
    Constant {
        value: Value,
        ty: Type,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct ConsumerData {
    pub(crate) id: u64,
    pub(crate) kind: ConsumerKind,
    pub(crate) dependencies: Vec<DependencyData>,
    pub(crate) scope: Scope,
    pub(crate) location: SourceLocation,
}

/// Anything that requests values through dependencies: a function, an
/// injectable struct, a value request, or a provider. Consumers are
/// immutable once built and cheap to clone.
#[derive(Clone)]
pub struct Consumer(Svc<ConsumerData>);

impl Consumer {
    pub(crate) fn publish(
        kind: ConsumerKind,
        dependencies: Vec<DependencyData>,
        scope: Scope,
        location: SourceLocation,
    ) -> Self {
        Consumer(Svc::new(ConsumerData {
            id: next_identity(),
            kind,
            dependencies,
            scope,
            location,
        }))
    }

    /// A copy of this consumer with a fresh identity.
    pub(crate) fn republish(&self, scope: Option<Scope>) -> Self {
        let data = &self.0;
        Consumer::publish(
            data.kind.clone(),
            data.dependencies.clone(),
            scope.unwrap_or_else(|| data.scope.clone()),
            data.location,
        )
    }

    pub(crate) fn data(&self) -> &ConsumerData {
        &self.0
    }

    /// Requests the parameters of a function.
    #[track_caller]
    pub fn func<D, F: IntoFunc<D>>(func: F) -> FuncConsumerBuilder {
        Consumer::from_func(Func::of(func))
    }

    /// Requests the parameters of an already reflected function.
    #[track_caller]
    pub fn from_func(func: Func) -> FuncConsumerBuilder {
        FuncConsumerBuilder {
            params: FuncParams::new(func),
            location: SourceLocation::caller(),
        }
    }

    /// Requests the fields of an injectable struct.
    #[track_caller]
    pub fn structure<T: Injectable>() -> StructConsumerBuilder<T> {
        StructConsumerBuilder {
            fields: StructFields::new(T::describe()),
            location: SourceLocation::caller(),
            marker: PhantomData,
        }
    }

    /// Requests a single value.
    #[track_caller]
    pub fn value<R: Request>() -> ValueConsumerBuilder<R> {
        ValueConsumerBuilder {
            requirement: R::requirement(),
            dependency: DependencyBuilder::new(),
            extract: R::from_value,
            location: SourceLocation::caller(),
        }
    }

    /// Requests a single value of a type only known at runtime.
    #[track_caller]
    pub fn value_of_type(ty: Type) -> ValueConsumerBuilder<Value> {
        ValueConsumerBuilder {
            requirement: Requirement::of(ty),
            dependency: DependencyBuilder::new(),
            extract: Ok,
            location: SourceLocation::caller(),
        }
    }

    /// Requests exactly one component for each of the criteria, in order.
    #[track_caller]
    pub fn load_criteria(
        criteria: impl IntoIterator<Item = Criteria>,
        scope: Scope,
    ) -> Self {
        let dependencies = criteria
            .into_iter()
            .enumerate()
            .map(|(index, criteria)| DependencyData {
                slot: Slot::Criteria(index),
                ty: criteria.ty(),
                name: criteria.name().map(ToOwned::to_owned),
                tags: criteria.tags().clone(),
                optional: false,
                collector: false,
            })
            .collect();

        Consumer::publish(
            ConsumerKind::LoadCriteria,
            dependencies,
            scope,
            SourceLocation::caller(),
        )
    }

    /// Requests every component provided in the given scope.
    #[track_caller]
    pub fn load_all(scope: Scope) -> Self {
        let dependency = DependencyData {
            slot: Slot::All,
            ty: Type::wildcard(),
            name: None,
            tags: Default::default(),
            optional: false,
            collector: true,
        };

        Consumer::publish(
            ConsumerKind::LoadAll,
            vec![dependency],
            scope,
            SourceLocation::caller(),
        )
    }

    /// The identity of this consumer. A provider shares the identity of its
    /// consumer.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// The scope this consumer resolves its dependencies from.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.0.scope
    }

    #[must_use]
    pub fn location(&self) -> SourceLocation {
        self.0.location
    }

    /// The dependencies in declared order.
    #[must_use]
    pub fn dependencies(&self) -> Vec<Dependency> {
        (0..self.0.dependencies.len())
            .map(|index| Dependency::new(self.clone(), index))
            .collect()
    }

    /// The struct fields left out through `ignore_fields`.
    #[must_use]
    pub fn ignored_fields(&self) -> &[String] {
        match &self.0.kind {
            ConsumerKind::Struct { ignored, .. } => ignored.as_slice(),
            _ => &[],
        }
    }

    /// How the values of the dependencies are combined into the consumer's
    /// value.
    #[must_use]
    pub fn valuer(&self) -> Valuer {
        match &self.0.kind {
            ConsumerKind::Func { func, .. } => Valuer::Func(func.clone()),
            ConsumerKind::Struct { info, .. } => Valuer::Struct(
                info.clone(),
                self.0
                    .dependencies
                    .iter()
                    .filter_map(|dependency| match &dependency.slot {
                        Slot::Field(name) => Some(name.clone()),
                        _ => None,
                    })
                    .collect(),
            ),
            ConsumerKind::Value | ConsumerKind::LoadAll => Valuer::Identity,
            ConsumerKind::LoadCriteria => Valuer::Collector(Type::wildcard()),
            ConsumerKind::Constant { value, .. } => Valuer::Const(value.clone()),
        }
    }

    /// Checks the consumer and its dependencies.
    #[must_use]
    pub fn validate(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        match &self.0.kind {
            ConsumerKind::Func { func, fake_params } => {
                for &index in fake_params {
                    issues.push(Issue::new(
                        Item::Dependency(Slot::Param(index)),
                        Problem::FakeParam {
                            index,
                            arity: func.arity(),
                        },
                    ));
                }
            }
            ConsumerKind::Struct {
                info, fake_fields, ..
            } => {
                if !info.ty().is_struct() || info.ty().is_error() {
                    issues.push(Issue::new(
                        Item::Provider,
                        Problem::NotStruct { ty: info.ty() },
                    ));
                }
                for name in fake_fields {
                    issues.push(Issue::new(
                        Item::Dependency(Slot::Field(name.clone())),
                        Problem::FakeField { name: name.clone() },
                    ));
                }
            }
            ConsumerKind::Constant { value, ty } => {
                if ty.is_error() {
                    issues.push(Issue::new(Item::Provider, Problem::ErrorType));
                }
                let matches = match value {
                    Value::Service(service) => (**service).type_id() == ty.id(),
                    _ => false,
                };
                if !matches {
                    issues.push(Issue::new(
                        Item::Provider,
                        Problem::ValueTypeMismatch { ty: *ty },
                    ));
                }
            }
            ConsumerKind::Value
            | ConsumerKind::LoadCriteria
            | ConsumerKind::LoadAll => {}
        }

        for dependency in &self.0.dependencies {
            dependency.validate(&mut issues);
        }

        issues
    }
}

impl PartialEq for Consumer {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Consumer {}

impl Debug for Consumer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Consumer({}#{})", self, self.0.id)
    }
}

impl Display for Consumer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0.kind {
            ConsumerKind::Func { func, .. } => write!(f, "func {}", func.name()),
            ConsumerKind::Struct { info, .. } => write!(f, "struct {}", info.ty()),
            ConsumerKind::Value => match self.0.dependencies.first() {
                Some(dependency) => write!(f, "value request for {}", dependency.ty),
                None => f.write_str("value request"),
            },
            ConsumerKind::LoadCriteria => f.write_str("criteria request"),
            ConsumerKind::LoadAll => {
                write!(f, "request for all components in {}", self.0.scope)
            }
            ConsumerKind::Constant { ty, .. } => write!(f, "value {}", ty),
        }
    }
}

/// Parameter configuration shared by function consumers and providers.
#[derive(Clone, Debug)]
pub(crate) struct FuncParams {
    func: Func,
    params: Vec<(usize, DependencyBuilder)>,
}

impl FuncParams {
    pub(crate) fn new(func: Func) -> Self {
        FuncParams {
            func,
            params: Vec::new(),
        }
    }

    pub(crate) fn func(&self) -> &Func {
        &self.func
    }

    /// Configures a parameter, replacing any earlier configuration of it.
    pub(crate) fn set(&mut self, index: usize, dependency: DependencyBuilder) {
        match self.params.iter_mut().find(|(param, _)| *param == index) {
            Some((_, existing)) => *existing = dependency,
            None => self.params.push((index, dependency)),
        }
    }

    pub(crate) fn build(&self) -> (ConsumerKind, Vec<DependencyData>) {
        let fake_params = self
            .params
            .iter()
            .map(|(index, _)| *index)
            .filter(|index| *index >= self.func.arity())
            .collect();

        let default = DependencyBuilder::new();
        let dependencies = self
            .func
            .params()
            .iter()
            .enumerate()
            .map(|(index, requirement)| {
                self.params
                    .iter()
                    .find(|(param, _)| *param == index)
                    .map_or(&default, |(_, dependency)| dependency)
                    .build(Slot::Param(index), *requirement)
            })
            .collect();

        let kind = ConsumerKind::Func {
            func: self.func.clone(),
            fake_params,
        };
        (kind, dependencies)
    }
}

/// Field configuration shared by struct consumers and providers.
#[derive(Clone)]
pub(crate) struct StructFields {
    info: StructInfo,
    fields: Vec<(String, DependencyBuilder)>,
    ignore: Option<Svc<DynFieldFilter>>,
}

impl StructFields {
    pub(crate) fn new(info: StructInfo) -> Self {
        StructFields {
            info,
            fields: Vec::new(),
            ignore: None,
        }
    }

    pub(crate) fn info(&self) -> &StructInfo {
        &self.info
    }

    pub(crate) fn set(&mut self, name: String, dependency: DependencyBuilder) {
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, existing)) => *existing = dependency,
            None => self.fields.push((name, dependency)),
        }
    }

    pub(crate) fn ignore(&mut self, filter: Svc<DynFieldFilter>) {
        self.ignore = Some(filter);
    }

    pub(crate) fn build(&self) -> (ConsumerKind, Vec<DependencyData>) {
        let is_ignored =
            |name: &str| self.ignore.as_ref().map_or(false, |ignore| ignore(name));

        let fake_fields = self
            .fields
            .iter()
            .filter(|(name, _)| self.info.field(name).is_none())
            .map(|(name, _)| name.clone())
            .collect();

        let ignored = self
            .info
            .fields()
            .iter()
            .filter(|field| is_ignored(field.name()))
            .map(|field| field.name().to_owned())
            .collect();

        let default = DependencyBuilder::new();
        let dependencies = self
            .info
            .fields()
            .iter()
            .filter(|field| !is_ignored(field.name()))
            .map(|field| {
                self.fields
                    .iter()
                    .find(|(name, _)| name == field.name())
                    .map_or(&default, |(_, dependency)| dependency)
                    .build(
                        Slot::Field(field.name().to_owned()),
                        field.requirement(),
                    )
            })
            .collect();

        let kind = ConsumerKind::Struct {
            info: self.info.clone(),
            ignored,
            fake_fields,
        };
        (kind, dependencies)
    }
}

impl Debug for StructFields {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructFields")
            .field("info", &self.info)
            .field("fields", &self.fields)
            .field("ignore", &self.ignore.is_some())
            .finish()
    }
}

/// Builds a consumer which calls a function with its resolved parameters.
#[derive(Clone, Debug)]
pub struct FuncConsumerBuilder {
    params: FuncParams,
    location: SourceLocation,
}

impl FuncConsumerBuilder {
    /// Qualifies the parameter at `index`. Indexes past the function's arity
    /// are kept and reported when the consumer is validated.
    #[must_use]
    pub fn param(mut self, index: usize, dependency: DependencyBuilder) -> Self {
        self.params.set(index, dependency);
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

    #[must_use]
    pub fn func(&self) -> &Func {
        self.params.func()
    }

    /// Publishes the consumer, resolving from the given scope.
    #[must_use]
    pub fn build(&self, scope: Scope) -> Consumer {
        let (kind, dependencies) = self.params.build();
        Consumer::publish(kind, dependencies, scope, self.location)
    }
}

/// Builds a consumer which creates an instance of `T` from its resolved
/// fields.
pub struct StructConsumerBuilder<T> {
    fields: StructFields,
    location: SourceLocation,
    marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> StructConsumerBuilder<T> {
    /// Qualifies a field. Names which are not fields of the struct are kept
    /// and reported when the consumer is validated.
    #[must_use]
    pub fn field(
        mut self,
        name: impl Into<String>,
        dependency: DependencyBuilder,
    ) -> Self {
        self.fields.set(name.into(), dependency);
        self
    }

    /// Leaves out every field for which `filter` returns `true`. Ignored
    /// fields receive the zero value, so they should be `Option`s or `Vec`s.
    #[must_use]
    pub fn ignore_fields(
        mut self,
        filter: impl Fn(&str) -> bool + Service,
    ) -> Self {
        self.fields.ignore(Svc::new(filter));
        self
    }

    #[must_use]
    pub fn location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    #[track_caller]
    pub fn update_call_location(self) -> Self {
        self.location(SourceLocation::caller())
    }

    #[must_use]
    pub fn build(&self, scope: Scope) -> Consumer {
        let (kind, dependencies) = self.fields.build();
        Consumer::publish(kind, dependencies, scope, self.location)
    }
}

impl<T> Clone for StructConsumerBuilder<T> {
    fn clone(&self) -> Self {
        StructConsumerBuilder {
            fields: self.fields.clone(),
            location: self.location,
            marker: PhantomData,
        }
    }
}

/// Builds a consumer requesting a single value, narrowed to `R`.
pub struct ValueConsumerBuilder<R> {
    requirement: Requirement,
    dependency: DependencyBuilder,
    extract: fn(Value) -> InjectResult<R>,
    location: SourceLocation,
}

impl<R> ValueConsumerBuilder<R> {
    #[must_use]
    pub fn by_name(mut self, name: impl Into<String>) -> Self {
        self.dependency = self.dependency.by_name(name);
        self
    }

    #[must_use]
    pub fn by_tags(mut self, tags: impl IntoIterator<Item = Symbol>) -> Self {
        self.dependency = self.dependency.by_tags(tags);
        self
    }

    #[must_use]
    pub fn by_tag(mut self, tag: Symbol) -> Self {
        self.dependency = self.dependency.by_tag(tag);
        self
    }

    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.dependency = self.dependency.optional(optional);
        self
    }

    #[must_use]
    pub fn as_collector(mut self, collector: bool) -> Self {
        self.dependency = self.dependency.as_collector(collector);
        self
    }

    #[must_use]
    pub fn apply(mut self, option: impl Into<Option<DependencyOption>>) -> Self {
        self.dependency = self.dependency.apply(option);
        self
    }

    #[must_use]
    pub fn location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    #[track_caller]
    pub fn update_call_location(self) -> Self {
        self.location(SourceLocation::caller())
    }

    #[must_use]
    pub fn build(&self, scope: Scope) -> Consumer {
        let dependency = self.dependency.build(Slot::Value, self.requirement);
        Consumer::publish(
            ConsumerKind::Value,
            vec![dependency],
            scope,
            self.location,
        )
    }

    pub(crate) fn extract(&self, value: Value) -> InjectResult<R> {
        (self.extract)(value)
    }
}

impl<R> Clone for ValueConsumerBuilder<R> {
    fn clone(&self) -> Self {
        ValueConsumerBuilder {
            requirement: self.requirement,
            dependency: self.dependency.clone(),
            extract: self.extract,
            location: self.location,
        }
    }
}
