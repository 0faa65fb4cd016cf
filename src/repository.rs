use crate::{Component, Criteria, Dependency, Module, OrderedSet, Scope, Symbol, Type};
use std::collections::HashMap;
use tracing::debug;

/// An insertion-ordered set of components.
pub type ComponentSet = OrderedSet<Component>;

#[derive(Default)]
struct TypeEntry {
    by_name: HashMap<String, ComponentSet>,
    by_tag: HashMap<Symbol, ComponentSet>,
    exposed: ComponentSet,
}

/// A read-only index over the components of a module. Ignored components
/// are left out entirely. Every set returned by a query iterates in module
/// insertion order.
pub struct Repository {
    entries: HashMap<Type, TypeEntry>,
    by_scope: HashMap<Scope, ComponentSet>,
    all: ComponentSet,
}

impl Repository {
    #[must_use]
    pub fn new(module: &Module) -> Self {
        let mut repository = Repository {
            entries: HashMap::new(),
            by_scope: HashMap::new(),
            all: ComponentSet::new(),
        };

        for component in module.all_components() {
            if component.is_ignored() {
                continue;
            }

            repository.insert(component);
        }

        debug!(
            components = repository.all.len(),
            types = repository.entries.len(),
            scopes = repository.by_scope.len(),
            "indexed module components"
        );
        repository
    }

    fn insert(&mut self, component: Component) {
        let types =
            std::iter::once(component.ty()).chain(component.aliases().iter().copied());
        for ty in types {
            let entry = self.entries.entry(ty).or_default();
            if let Some(name) = component.name() {
                entry
                    .by_name
                    .entry(name.to_owned())
                    .or_default()
                    .insert(component.clone());
            }
            for tag in component.tags() {
                entry
                    .by_tag
                    .entry(tag.clone())
                    .or_default()
                    .insert(component.clone());
            }
            if !component.is_hidden() {
                entry.exposed.insert(component.clone());
            }
        }

        self.by_scope
            .entry(component.scope().clone())
            .or_default()
            .insert(component.clone());
        self.all.insert(component);
    }

    /// Every indexed component.
    #[must_use]
    pub fn all_components(&self) -> &ComponentSet {
        &self.all
    }

    /// The components whose provider lives in the given scope. `None` is the
    /// global scope.
    #[must_use]
    pub fn components_with_scope(&self, scope: Option<&Scope>) -> ComponentSet {
        let global = Scope::global();
        let scope = scope.unwrap_or(&global);
        self.by_scope.get(scope).cloned().unwrap_or_default()
    }

    /// The components matching the criteria.
    ///
    /// When both a name and tags are given, the name index is used to find
    /// candidates and the tags are checked afterwards.
    #[must_use]
    pub fn components_match(&self, criteria: &Criteria) -> ComponentSet {
        if criteria.is_match_all() {
            return self.all.clone();
        }

        let entry = match self.entries.get(&criteria.ty()) {
            Some(entry) => entry,
            None => return ComponentSet::new(),
        };

        let candidates = if let Some(name) = criteria.name() {
            entry.by_name.get(name)
        } else if let Some(tag) = criteria.tags().first() {
            entry.by_tag.get(tag)
        } else {
            return entry.exposed.clone();
        };

        candidates
            .into_iter()
            .flatten()
            .filter(|component| component.matches(criteria))
            .cloned()
            .collect()
    }

    /// The components a dependency can be bound to from its consumer's
    /// scope. A consumer never depends on itself, and only sees components
    /// provided in its own scope or in one of its ancestors.
    #[must_use]
    pub fn components_match_dependency(
        &self,
        dependency: &Dependency,
    ) -> ComponentSet {
        let consumer = dependency.consumer();
        let criteria = dependency.criteria();
        if criteria.is_match_all() {
            return self.components_with_scope(Some(consumer.scope()));
        }

        self.components_match(&criteria)
            .into_iter()
            .filter(|component| {
                let provider = component.provider();
                provider.id() != consumer.id()
                    && (provider.scope() == consumer.scope()
                        || consumer.scope().can_enter_from(provider.scope()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Repository;
    use crate::{
        interface, Consumer, Criteria, DependencyBuilder, Module, Provider,
        Scope, Service, Svc, Symbol, Type,
    };

    trait Greeter: Service {}
    struct English;
    impl Greeter for English {}
    interface!(Greeter = [English]);

    fn sample() -> (Module, Symbol) {
        let tag = Symbol::new("special");
        let module = Module::builder()
            .provide(Provider::value(1_i32).name("one"))
            .provide(Provider::value(2_i32).name("two").tag(tag.clone()))
            .provide(Provider::value(3_i32).name("three").hide())
            .provide(Provider::value(4_i32).ignore())
            .provide(Provider::value(English).alias::<dyn Greeter>())
            .build();
        (module, tag)
    }

    #[test]
    fn ignored_components_are_not_indexed() {
        let (module, _) = sample();
        let repository = Repository::new(&module);

        let expected: Vec<_> = module
            .all_components()
            .into_iter()
            .filter(|component| !component.is_ignored())
            .collect();
        let actual: Vec<_> = repository.all_components().iter().cloned().collect();
        assert_eq!(expected, actual);

        for component in repository.all_components() {
            assert!(repository
                .components_with_scope(Some(component.scope()))
                .has(component));
        }
    }

    #[test]
    fn wildcard_matches_everything() {
        let (module, _) = sample();
        let repository = Repository::new(&module);
        assert_eq!(
            repository.all_components(),
            &repository.components_match(&Criteria::wildcard())
        );
    }

    #[test]
    fn lookups_use_the_indexes() {
        let (module, tag) = sample();
        let repository = Repository::new(&module);
        let ints = Criteria::of(Type::of::<i32>());

        assert_eq!(2, repository.components_match(&ints).len());
        assert_eq!(1, repository.components_match(&ints.clone().named("three")).len());
        assert_eq!(1, repository.components_match(&ints.clone().with_tag(tag.clone())).len());
        assert!(repository
            .components_match(&ints.clone().named("one").with_tag(tag))
            .is_empty());
        assert!(repository
            .components_match(&Criteria::of(Type::of::<u8>()))
            .is_empty());
        assert_eq!(
            1,
            repository
                .components_match(&Criteria::of(Type::of::<dyn Greeter>()))
                .len()
        );
    }

    #[test]
    fn dependencies_only_see_outward_scopes() {
        let parent = Scope::new("parent");
        let child = Scope::with_parents("child", [parent.clone()]);
        let module = Module::builder()
            .provide(Provider::value(1_u8))
            .provide(Provider::value(2_u8).in_scope(parent.clone()))
            .provide(Provider::value(3_u8).in_scope(child.clone()))
            .build();
        let repository = Repository::new(&module);

        let count_from = |scope: &Scope| {
            let consumer = Consumer::value::<Vec<Svc<u8>>>().build(scope.clone());
            let dependencies = consumer.dependencies();
            repository.components_match_dependency(&dependencies[0]).len()
        };
        assert_eq!(1, count_from(&Scope::global()));
        assert_eq!(2, count_from(&parent));
        assert_eq!(3, count_from(&child));
    }

    #[test]
    fn providers_never_depend_on_themselves() {
        let module = Module::builder()
            .provide(
                Provider::func(|previous: Option<Svc<u8>>| {
                    previous.map_or(0, |value| *value + 1)
                })
                .param(0, DependencyBuilder::new()),
            )
            .build();
        let repository = Repository::new(&module);
        let providers = module.all_providers();
        let dependencies = providers[0].consumer().dependencies();
        let dependency = &dependencies[0];
        assert!(repository.components_match_dependency(dependency).is_empty());
        assert_eq!(
            1,
            repository
                .components_match(&Criteria::of(Type::of::<u8>()))
                .len()
        );
    }

    #[test]
    fn load_all_sees_a_single_scope() {
        let scope = Scope::new("request");
        let module = Module::builder()
            .provide(Provider::value(1_u8))
            .provide(Provider::value(2_u16).in_scope(scope.clone()))
            .build();
        let repository = Repository::new(&module);

        let consumer = Consumer::load_all(scope);
        let dependencies = consumer.dependencies();
        let matched = repository.components_match_dependency(&dependencies[0]);
        assert_eq!(1, matched.len());
        assert_eq!(Some(Type::of::<u16>()), matched.first().map(|c| c.ty()));
    }
}
