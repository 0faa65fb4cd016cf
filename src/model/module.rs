use crate::{
    next_identity, Component, Issue, Item, Problem, Provider, ProviderBuilder,
    Scope, SourceLocation, Svc, Type, ValidationErrors,
};
use std::{
    collections::{HashMap, HashSet},
    fmt::{Debug, Formatter},
};

#[derive(Clone, Debug)]
enum ModuleEntry {
    Provider(Provider),
    Module(Module),
}

struct ModuleData {
    id: u64,
    entries: Vec<ModuleEntry>,
    location: SourceLocation,
}

/// An immutable aggregate of providers and sub-modules. Modules can be used
/// to group together related providers and configure a container in pieces
/// rather than all at once.
///
/// For creating a module easily via a domain specific language, see
/// [`define_module!`].
#[derive(Clone)]
pub struct Module(Svc<ModuleData>);

impl Module {
    #[must_use]
    #[track_caller]
    pub fn builder() -> ModuleBuilder {
        ModuleBuilder::new()
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    #[must_use]
    pub fn location(&self) -> SourceLocation {
        self.0.location
    }

    /// This module and every transitive sub-module, each once, in the order
    /// they are first reached.
    #[must_use]
    pub fn all_modules(&self) -> Vec<Module> {
        let mut seen = HashSet::new();
        let mut modules = Vec::new();
        self.collect_modules(&mut seen, &mut modules);
        modules
    }

    fn collect_modules(&self, seen: &mut HashSet<u64>, modules: &mut Vec<Module>) {
        if !seen.insert(self.id()) {
            return;
        }

        modules.push(self.clone());
        for entry in &self.0.entries {
            if let ModuleEntry::Module(module) = entry {
                module.collect_modules(seen, modules);
            }
        }
    }

    /// Every provider of this module and its sub-modules, each once. Entries
    /// are visited in insertion order, descending into sub-modules where
    /// they were added.
    #[must_use]
    pub fn all_providers(&self) -> Vec<Provider> {
        let mut seen_modules = HashSet::new();
        let mut seen_providers = HashSet::new();
        let mut providers = Vec::new();
        self.collect_providers(&mut seen_modules, &mut seen_providers, &mut providers);
        providers
    }

    fn collect_providers(
        &self,
        seen_modules: &mut HashSet<u64>,
        seen_providers: &mut HashSet<u64>,
        providers: &mut Vec<Provider>,
    ) {
        if !seen_modules.insert(self.id()) {
            return;
        }

        for entry in &self.0.entries {
            match entry {
                ModuleEntry::Provider(provider) => {
                    if seen_providers.insert(provider.id()) {
                        providers.push(provider.clone());
                    }
                }
                ModuleEntry::Module(module) => {
                    module.collect_providers(seen_modules, seen_providers, providers);
                }
            }
        }
    }

    /// Every component of every provider, in provider order and then in
    /// declared order. This is the insertion order used for collectors.
    #[must_use]
    pub fn all_components(&self) -> Vec<Component> {
        self.all_providers()
            .iter()
            .flat_map(Provider::components)
            .collect()
    }

    /// Validates every provider and checks that no two components share both
    /// a type and a name. All issues are collected before returning.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let providers = self.all_providers();
        let mut issues: HashMap<u64, Vec<Issue>> = providers
            .iter()
            .map(|provider| (provider.id(), provider.validate()))
            .collect();

        let mut named: HashMap<(Type, String), SourceLocation> = HashMap::new();
        for component in self.all_components() {
            let name = match component.name() {
                Some(name) => name.to_owned(),
                None => continue,
            };

            let provider = component.provider();
            let key = (component.ty(), name.clone());
            match named.get(&key) {
                Some(first) => {
                    let problem = Problem::DuplicateComponent {
                        ty: component.ty(),
                        name,
                        first: *first,
                    };
                    issues
                        .entry(provider.id())
                        .or_default()
                        .push(Issue::new(Item::Component(component.index()), problem));
                }
                None => {
                    named.insert(key, provider.location());
                }
            }
        }

        let mut errors = ValidationErrors::new();
        for provider in &providers {
            if let Some(provider_issues) = issues.remove(&provider.id()) {
                errors.push(provider.to_string(), provider.location(), provider_issues);
            }
        }

        errors.into_result()
    }

    /// A builder which publishes a copy of this module. Every provider of the
    /// copy gets a fresh identity.
    #[must_use]
    pub fn to_builder(&self) -> ModuleBuilder {
        let entries = self
            .0
            .entries
            .iter()
            .map(|entry| match entry {
                ModuleEntry::Provider(provider) => {
                    BuilderEntry::Provider(ProviderBuilder::from(provider.clone()))
                }
                ModuleEntry::Module(module) => {
                    BuilderEntry::Builder(module.to_builder())
                }
            })
            .collect();

        ModuleBuilder {
            entries,
            location: self.0.location,
        }
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Module {}

impl Debug for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.0.id)
            .field("location", &self.0.location)
            .field("entries", &self.0.entries)
            .finish()
    }
}

#[derive(Clone, Debug)]
enum BuilderEntry {
    Provider(ProviderBuilder),
    Module(Module),
    Builder(ModuleBuilder),
}

/// Accumulates providers and sub-modules for a [`Module`].
#[derive(Clone, Debug)]
pub struct ModuleBuilder {
    entries: Vec<BuilderEntry>,
    location: SourceLocation,
}

impl ModuleBuilder {
    #[must_use]
    #[track_caller]
    pub fn new() -> Self {
        ModuleBuilder {
            entries: Vec::new(),
            location: SourceLocation::caller(),
        }
    }

    /// Adds a provider.
    #[must_use]
    pub fn provide(mut self, provider: impl Into<ProviderBuilder>) -> Self {
        self.entries.push(BuilderEntry::Provider(provider.into()));
        self
    }

    /// Adds a published sub-module. It keeps its identity, so a sub-module
    /// shared between several parents is only visited once.
    #[must_use]
    pub fn sub_module(mut self, module: Module) -> Self {
        self.entries.push(BuilderEntry::Module(module));
        self
    }

    /// Adds providers placed in the given scope.
    #[must_use]
    pub fn with_scope<P: Into<ProviderBuilder>>(
        mut self,
        scope: Scope,
        providers: impl IntoIterator<Item = P>,
    ) -> Self {
        for provider in providers {
            let provider = provider.into().in_scope(scope.clone());
            self.entries.push(BuilderEntry::Provider(provider));
        }
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

    /// Publishes the module. Every call publishes the providers added to this
    /// builder with fresh identities. Published sub-modules are shared.
    #[must_use]
    pub fn build(&self) -> Module {
        let entries = self
            .entries
            .iter()
            .map(|entry| match entry {
                BuilderEntry::Provider(provider) => {
                    ModuleEntry::Provider(provider.build())
                }
                BuilderEntry::Module(module) => ModuleEntry::Module(module.clone()),
                BuilderEntry::Builder(module) => ModuleEntry::Module(module.build()),
            })
            .collect();

        Module(Svc::new(ModuleData {
            id: next_identity(),
            entries,
            location: self.location,
        }))
    }
}

impl Default for ModuleBuilder {
    #[track_caller]
    fn default() -> Self {
        ModuleBuilder::new()
    }
}

/// Defines a new module using a domain specific language.
///
/// # Example
///
/// ```
/// use runtime_resolver::{define_module, Provider, Scope, Svc};
///
/// let request = Scope::new("request");
/// let shared = define_module! {
///     providers = [Provider::value(8080_u16)],
/// };
///
/// let module = define_module! {
///     providers = [
///         Provider::value("localhost".to_owned()),
///         Provider::func(|port: Svc<u16>| u32::from(*port)),
///     ],
///     modules = [shared],
///     scoped = {
///         request => [Provider::value(true)],
///     },
/// };
///
/// assert_eq!(4, module.all_providers().len());
/// assert!(module.validate().is_ok());
/// ```
#[macro_export]
macro_rules! define_module {
    {
        $($key:ident = $value:tt),*
        $(,)?
    } => {
        {
            #[allow(unused_mut)]
            let mut module = $crate::Module::builder();
            $(module = $crate::define_module!(@entries module, $key = $value);)*
            module.build()
        }
    };
    (
        @entries $module:expr,
        providers = [
            $($provider:expr),*
            $(,)?
        ]
    ) => {
        $module$(.provide($provider))*
    };
    (
        @entries $module:expr,
        modules = [
            $($sub_module:expr),*
            $(,)?
        ]
    ) => {
        $module$(.sub_module($sub_module))*
    };
    (
        @entries $module:expr,
        scoped = {
            $($scope:expr => [
                $($provider:expr),*
                $(,)?
            ]),*
            $(,)?
        }
    ) => {
        $module$(.with_scope(
            $scope,
            ::std::vec![$($crate::ProviderBuilder::from($provider)),*],
        ))*
    };
}

#[cfg(test)]
mod tests {
    use crate::{
        ComponentBuilder, Item, Module, Problem, Provider, Scope, Svc, Type,
    };

    #[test]
    fn providers_are_listed_in_insertion_order() {
        let inner = Module::builder().provide(Provider::value(2_u8)).build();
        let module = Module::builder()
            .provide(Provider::value(1_u8))
            .sub_module(inner.clone())
            .provide(Provider::value(3_u8))
            .sub_module(inner)
            .build();

        let types: Vec<_> = module
            .all_components()
            .iter()
            .map(|component| component.ty())
            .collect();
        assert_eq!(vec![Type::of::<u8>(); 3], types);
        assert_eq!(2, module.all_modules().len());
        assert_eq!(3, module.all_providers().len());
    }

    #[test]
    fn shared_sub_modules_keep_their_providers() {
        let inner = Module::builder().provide(Provider::value(2_u8)).build();
        let inner_provider = inner.all_providers()[0].clone();
        let module = Module::builder().sub_module(inner).build();
        assert_eq!(inner_provider, module.all_providers()[0]);
    }

    #[test]
    fn scoped_providers_move_to_their_scope() {
        let scope = Scope::new("request");
        let module = Module::builder()
            .with_scope(scope.clone(), vec![Provider::value(1_i32)])
            .build();
        assert_eq!(&scope, module.all_providers()[0].scope());
    }

    #[test]
    fn duplicate_names_are_reported_on_the_second_provider() {
        let module = Module::builder()
            .provide(Provider::value(1_i32).name("x"))
            .provide(Provider::value(2_i32).name("x"))
            .provide(Provider::value(3_u32).name("x"))
            .provide(
                Provider::func(|| 4_i32).output(0, ComponentBuilder::new().name("y")),
            )
            .build();

        let errors = module.validate().unwrap_err();
        let issues: Vec<_> = errors.issues().collect();
        assert_eq!(1, issues.len());
        assert_eq!(&Item::Component(0), issues[0].item());
        assert!(matches!(
            issues[0].problem(),
            Problem::DuplicateComponent { name, .. } if name == "x"
        ));

        let providers: Vec<_> = errors
            .groups()
            .flat_map(|(_, providers)| providers.iter())
            .collect();
        assert_eq!(providers[0].description(), "value i32");
    }

    #[test]
    fn copies_have_the_same_components_under_new_identities() {
        let module = Module::builder()
            .provide(Provider::value(1_i32).name("a"))
            .provide(Provider::func(|a: Svc<i32>| *a as u64))
            .build();
        let copy = module.to_builder().build();

        let describe = |module: &Module| -> Vec<_> {
            module
                .all_components()
                .iter()
                .map(|component| (component.ty(), component.name().map(ToOwned::to_owned)))
                .collect()
        };
        assert_eq!(describe(&module), describe(&copy));
        assert_ne!(module, copy);
        assert_ne!(module.all_providers()[0], copy.all_providers()[0]);
    }
}
