use crate::{
    engine::Engine, planner::Planner, Consumer, ContainerBuilder, Criteria,
    Ctx, FuncConsumerBuilder, InjectError, InjectResult, Injectable, IntoFunc,
    Module, Plan, Repository, Request, Scope, StructConsumerBuilder, Svc,
    ValidationErrors, Value, ValueConsumerBuilder,
};
use std::fmt::{Debug, Formatter};
use tracing::{debug, warn};

/// Tolerances applied while planning. By default, every missing, uncertain
/// or cyclic dependency is an error.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub struct ContainerOptions {
    /// Unresolved dependencies resolve to nothing instead of failing.
    pub ignore_missing: bool,
    /// Dependencies matching several components are treated as missing.
    pub ignore_uncertain: bool,
    /// Dependencies closing a cycle are cut and treated as missing.
    pub ignore_cycle: bool,
}

impl ContainerOptions {
    #[must_use]
    pub fn new() -> Self {
        ContainerOptions::default()
    }

    #[must_use]
    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = ignore;
        self
    }

    #[must_use]
    pub fn ignore_uncertain(mut self, ignore: bool) -> Self {
        self.ignore_uncertain = ignore;
        self
    }

    #[must_use]
    pub fn ignore_cycle(mut self, ignore: bool) -> Self {
        self.ignore_cycle = ignore;
        self
    }
}

/// A runtime dependency injection container. This holds a validated module
/// and the repository indexing its components, and resolves requests
/// against them.
///
/// Containers are immutable. Cloning a container is cheap and both clones
/// share the same repository. Values are memoised in the frames of the
/// [`Ctx`] they were resolved under, not in the container, so a value
/// resolved under one context is never reused by another.
///
/// ```
/// use runtime_resolver::{
///     ComponentBuilder, Consumer, Container, Ctx, Module, Provider, Svc,
/// };
///
/// fn greeting(name: Svc<String>) -> String {
///     format!("Hello, {}!", name)
/// }
///
/// let module = Module::builder()
///     .provide(Provider::value("world".to_owned()))
///     .provide(
///         Provider::func(greeting)
///             .output(0, ComponentBuilder::new().name("greeting")),
///     )
///     .build();
/// let container = Container::new(module).unwrap();
///
/// let message: Svc<String> = container
///     .value_of(&Ctx::new(), Consumer::value().by_name("greeting"))
///     .unwrap();
/// assert_eq!("Hello, world!", message.as_str());
/// ```
#[derive(Clone)]
pub struct Container {
    module: Module,
    repository: Svc<Repository>,
    options: ContainerOptions,
}

impl Container {
    /// Creates a builder for a container.
    #[must_use]
    #[track_caller]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Validates the module and indexes its components using the default
    /// options.
    pub fn new(module: Module) -> InjectResult<Self> {
        Container::with_options(module, ContainerOptions::default())
    }

    /// Validates the module and indexes its components. Every validation
    /// issue in the module is reported at once.
    pub fn with_options(
        module: Module,
        options: ContainerOptions,
    ) -> InjectResult<Self> {
        if let Err(errors) = module.validate() {
            warn!(
                module = %module.location(),
                issues = errors.issues().count(),
                "rejected invalid module"
            );
            return Err(InjectError::Validation(errors));
        }

        let repository = Repository::new(&module);
        debug!(
            module = %module.location(),
            components = repository.all_components().len(),
            ?options,
            "created container"
        );
        Ok(Container {
            module,
            repository: Svc::new(repository),
            options,
        })
    }

    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    #[must_use]
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    #[must_use]
    pub fn options(&self) -> ContainerOptions {
        self.options
    }

    /// Validates a consumer and plans the resolution of its dependencies.
    pub fn plan(&self, consumer: &Consumer) -> InjectResult<Plan> {
        let issues = consumer.validate();
        if !issues.is_empty() {
            let mut errors = ValidationErrors::new();
            errors.push(consumer.to_string(), consumer.location(), issues);
            return Err(InjectError::Validation(errors));
        }

        Planner::new(&self.repository, self.options).plan(consumer)
    }

    /// Produces the value of a plan's consumer under the given context.
    pub fn execute(&self, ctx: &Ctx, plan: &Plan) -> InjectResult<Value> {
        Engine::new(ctx, plan).run()
    }

    fn resolve(&self, ctx: &Ctx, consumer: &Consumer) -> InjectResult<Value> {
        let plan = self.plan(consumer)?;
        self.execute(ctx, &plan)
    }

    /// Resolves the parameters of a function and calls it. Returns the
    /// function's non-error outputs in order.
    pub fn func_of(
        &self,
        ctx: &Ctx,
        func: FuncConsumerBuilder,
    ) -> InjectResult<Vec<Value>> {
        let consumer = func.build(ctx.current_scope().clone());
        Ok(self.resolve(ctx, &consumer)?.spread())
    }

    /// Resolves the fields of an injectable struct and builds it.
    pub fn struct_of<T: Injectable>(
        &self,
        ctx: &Ctx,
        structure: StructConsumerBuilder<T>,
    ) -> InjectResult<Svc<T>> {
        let consumer = structure.build(ctx.current_scope().clone());
        self.resolve(ctx, &consumer)?.downcast::<T>()
    }

    /// Resolves a single request.
    pub fn value_of<R>(
        &self,
        ctx: &Ctx,
        value: ValueConsumerBuilder<R>,
    ) -> InjectResult<R> {
        let consumer = value.build(ctx.current_scope().clone());
        let resolved = self.resolve(ctx, &consumer)?;
        value.extract(resolved)
    }

    /// Resolves exactly one component for each of the criteria, in order.
    #[track_caller]
    pub fn load_criteria(
        &self,
        ctx: &Ctx,
        criteria: impl IntoIterator<Item = Criteria>,
    ) -> InjectResult<Vec<Value>> {
        let consumer =
            Consumer::load_criteria(criteria, ctx.current_scope().clone());
        Ok(self.resolve(ctx, &consumer)?.spread())
    }

    /// Resolves every component provided in a scope, in module order. `None`
    /// is the current scope of the context.
    #[track_caller]
    pub fn load_all(
        &self,
        ctx: &Ctx,
        scope: Option<&Scope>,
    ) -> InjectResult<Vec<Value>> {
        let scope = scope.unwrap_or_else(|| ctx.current_scope()).clone();
        let consumer = Consumer::load_all(scope);
        Ok(self.resolve(ctx, &consumer)?.spread())
    }

    /// Resolves a request under a fresh context.
    ///
    /// ```
    /// use runtime_resolver::{Container, Module, Provider, Svc};
    ///
    /// let module = Module::builder().provide(Provider::value(42_i32)).build();
    /// let container = Container::new(module).unwrap();
    ///
    /// let answer: Svc<i32> = container.get().unwrap();
    /// let nothing: Option<Svc<u8>> = container.get().unwrap();
    /// assert_eq!(42, *answer);
    /// assert!(nothing.is_none());
    /// ```
    #[track_caller]
    pub fn get<R: Request>(&self) -> InjectResult<R> {
        self.value_of(&Ctx::new(), Consumer::value::<R>())
    }

    /// Resolves the parameters of a function under a fresh context and calls
    /// it.
    #[track_caller]
    pub fn invoke<D, F: IntoFunc<D>>(
        &self,
        func: F,
    ) -> InjectResult<Svc<F::Output>> {
        let outputs = self.func_of(&Ctx::new(), Consumer::func(func))?;
        match outputs.first() {
            Some(output) => output.downcast::<F::Output>(),
            None => Err(InjectError::InternalError(
                "a function returned no outputs".to_owned(),
            )),
        }
    }

    /// Enters a scope. See [`Ctx::enter_scope()`].
    pub fn enter_scope(&self, ctx: &Ctx, scope: &Scope) -> InjectResult<Ctx> {
        ctx.enter_scope(scope)
    }

    /// Leaves a scope. See [`Ctx::leave_scope()`].
    pub fn leave_scope(&self, ctx: &Ctx, scope: &Scope) -> InjectResult<Ctx> {
        ctx.leave_scope(scope)
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("module", &self.module)
            .field("components", &self.repository.all_components().len())
            .field("options", &self.options)
            .finish()
    }
}
