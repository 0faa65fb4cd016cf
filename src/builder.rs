use crate::{
    Container, ContainerOptions, InjectResult, Module, ModuleBuilder,
    ProviderBuilder, Scope,
};

/// A builder for a [`Container`].
///
/// ```
/// use runtime_resolver::{Container, Provider, Svc};
///
/// let mut builder = Container::builder();
/// builder.provide(Provider::value(1_u8).name("one"));
/// builder.provide(Provider::value(2_u8).name("two"));
/// builder.options_mut().ignore_uncertain = true;
///
/// let container = builder.build().unwrap();
/// let numbers: Vec<Svc<u8>> = container.get().unwrap();
/// let nothing: Option<Svc<u8>> = container.get().unwrap();
/// assert_eq!(2, numbers.len());
/// assert!(nothing.is_none());
/// ```
#[derive(Debug)]
pub struct ContainerBuilder {
    module: ModuleBuilder,
    options: ContainerOptions,
}

impl ContainerBuilder {
    #[must_use]
    #[track_caller]
    pub fn new() -> Self {
        ContainerBuilder {
            module: ModuleBuilder::new(),
            options: ContainerOptions::default(),
        }
    }

    /// Adds a provider to the root module.
    pub fn provide(&mut self, provider: impl Into<ProviderBuilder>) {
        self.update(|module| module.provide(provider));
    }

    /// Adds a module whose providers become part of the container.
    pub fn add_module(&mut self, module: Module) {
        self.update(|builder| builder.sub_module(module));
    }

    /// Adds providers which all live in the given scope.
    pub fn with_scope<P: Into<ProviderBuilder>>(
        &mut self,
        scope: Scope,
        providers: impl IntoIterator<Item = P>,
    ) {
        self.update(|module| module.with_scope(scope, providers));
    }

    fn update(&mut self, f: impl FnOnce(ModuleBuilder) -> ModuleBuilder) {
        let module = std::mem::take(&mut self.module);
        self.module = f(module);
    }

    /// Replaces the options the container is created with.
    pub fn options(&mut self, options: ContainerOptions) {
        self.options = options;
    }

    pub fn options_mut(&mut self) -> &mut ContainerOptions {
        &mut self.options
    }

    /// Builds the root module and creates a container from it.
    pub fn build(self) -> InjectResult<Container> {
        Container::with_options(self.module.build(), self.options)
    }
}

impl Default for ContainerBuilder {
    #[track_caller]
    fn default() -> Self {
        ContainerBuilder::new()
    }
}
