use crate::{
    Component, Consumer, ContainerOptions, Dependency, InjectError,
    InjectResult, Provider, Repository,
};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, trace};

/// How a dependency was resolved.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Resolution {
    /// Bound to exactly one component.
    Exclusive,
    /// Bound to every matching component.
    Collector,
    /// Nothing matched. Only planned if the dependency is optional or
    /// missing dependencies are ignored.
    Missing,
    /// Several components matched a dependency needing one. Only planned if
    /// uncertain dependencies are ignored, in which case it is treated like a
    /// missing dependency.
    Uncertain,
    /// The only candidate was part of a cycle. Only planned if cycles are
    /// ignored, in which case it is treated like a missing dependency.
    Cycle,
}

/// The components chosen for a dependency.
#[derive(Clone, Debug)]
pub struct Binding {
    resolution: Resolution,
    components: Vec<Component>,
}

impl Binding {
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// The bound components, in the order their values are produced.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }
}

/// The resolved dependency graph of a consumer. Plans are immutable and can
/// be executed any number of times.
#[derive(Clone, Debug)]
pub struct Plan {
    root: Consumer,
    bindings: IndexMap<Dependency, Binding>,
    order: Vec<Provider>,
}

impl Plan {
    /// The consumer this plan was made for.
    #[must_use]
    pub fn root(&self) -> &Consumer {
        &self.root
    }

    #[must_use]
    pub fn binding(&self, dependency: &Dependency) -> Option<&Binding> {
        self.bindings.get(dependency)
    }

    /// Every reached dependency with its binding, in the order they were
    /// planned.
    pub fn bindings(&self) -> impl Iterator<Item = (&Dependency, &Binding)> {
        self.bindings.iter()
    }

    /// Every reached provider, each after the providers it depends on.
    #[must_use]
    pub fn order(&self) -> &[Provider] {
        &self.order
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Visit {
    InProgress,
    Done,
}

/// Plans dependency resolution through a depth-first walk of the provider
/// graph. Errors are collected along the way so a single failed plan reports
/// every unresolved dependency.
pub(crate) struct Planner<'a> {
    repository: &'a Repository,
    options: ContainerOptions,
    visits: HashMap<u64, Visit>,
    path: Vec<Provider>,
    bindings: IndexMap<Dependency, Binding>,
    order: Vec<Provider>,
    errors: Vec<InjectError>,
}

impl<'a> Planner<'a> {
    pub(crate) fn new(repository: &'a Repository, options: ContainerOptions) -> Self {
        Planner {
            repository,
            options,
            visits: HashMap::new(),
            path: Vec::new(),
            bindings: IndexMap::new(),
            order: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn plan(mut self, root: &Consumer) -> InjectResult<Plan> {
        for dependency in root.dependencies() {
            self.resolve(dependency);
        }

        InjectError::aggregate(self.errors)?;
        debug!(
            consumer = %root,
            bindings = self.bindings.len(),
            providers = self.order.len(),
            "planned resolution"
        );
        Ok(Plan {
            root: root.clone(),
            bindings: self.bindings,
            order: self.order,
        })
    }

    fn resolve(&mut self, dependency: Dependency) {
        let candidates =
            self.repository.components_match_dependency(&dependency);

        if dependency.is_collector() {
            let mut components = Vec::with_capacity(candidates.len());
            for component in candidates {
                if self.in_progress(component.provider()) {
                    if self.options.ignore_cycle {
                        trace!(%dependency, %component, "dropped cyclic candidate");
                    } else {
                        self.errors.push(self.cycle_error(&dependency, &component));
                    }
                    continue;
                }

                self.visit(component.provider());
                components.push(component);
            }

            self.bind(dependency, Resolution::Collector, components);
            return;
        }

        match candidates.len() {
            0 => self.missing(dependency, Resolution::Missing),
            1 => {
                let component = match candidates.into_iter().next() {
                    Some(component) => component,
                    None => return,
                };

                if !self.in_progress(component.provider()) {
                    self.visit(component.provider());
                    self.bind(dependency, Resolution::Exclusive, vec![component]);
                } else if self.options.ignore_cycle {
                    trace!(%dependency, %component, "cut cyclic dependency");
                    self.missing(dependency, Resolution::Cycle);
                } else {
                    self.errors.push(self.cycle_error(&dependency, &component));
                    self.bind(dependency, Resolution::Cycle, Vec::new());
                }
            }
            _ if self.options.ignore_uncertain => {
                trace!(%dependency, candidates = candidates.len(), "ignored uncertain dependency");
                self.missing(dependency, Resolution::Uncertain);
            }
            _ => {
                self.errors.push(InjectError::UncertainDependency {
                    dependency: dependency.to_string(),
                    location: dependency.consumer().location(),
                    candidates: candidates.iter().map(ToString::to_string).collect(),
                });
                self.bind(dependency, Resolution::Uncertain, Vec::new());
            }
        }
    }

    fn missing(&mut self, dependency: Dependency, resolution: Resolution) {
        if !dependency.is_optional() && !self.options.ignore_missing {
            self.errors.push(InjectError::MissingDependency {
                dependency: dependency.to_string(),
                location: dependency.consumer().location(),
            });
        }

        self.bind(dependency, resolution, Vec::new());
    }

    fn bind(
        &mut self,
        dependency: Dependency,
        resolution: Resolution,
        components: Vec<Component>,
    ) {
        trace!(%dependency, ?resolution, components = components.len(), "bound dependency");
        self.bindings.insert(
            dependency,
            Binding {
                resolution,
                components,
            },
        );
    }

    fn in_progress(&self, provider: &Provider) -> bool {
        self.visits.get(&provider.id()) == Some(&Visit::InProgress)
    }

    fn visit(&mut self, provider: &Provider) {
        if self.visits.contains_key(&provider.id()) {
            return;
        }

        self.visits.insert(provider.id(), Visit::InProgress);
        self.path.push(provider.clone());
        for dependency in provider.consumer().dependencies() {
            self.resolve(dependency);
        }
        self.path.pop();
        self.visits.insert(provider.id(), Visit::Done);
        self.order.push(provider.clone());
    }

    fn cycle_error(&self, dependency: &Dependency, component: &Component) -> InjectError {
        let start = self
            .path
            .iter()
            .position(|provider| provider == component.provider())
            .unwrap_or(0);
        let mut cycle: Vec<String> =
            self.path[start..].iter().map(ToString::to_string).collect();
        cycle.push(component.provider().to_string());

        InjectError::CyclicDependency {
            dependency: dependency.to_string(),
            location: dependency.consumer().location(),
            cycle,
        }
    }
}
