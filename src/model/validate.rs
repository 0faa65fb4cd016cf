#![allow(clippy::used_underscore_binding)]

use crate::{Slot, SourceLocation, Type};
use derive_more::Display;
use indexmap::IndexMap;
use std::fmt::{Display as FmtDisplay, Formatter};

/// What is wrong with an item.
#[derive(Clone, PartialEq, Eq, Debug, Display)]
pub enum Problem {
    #[display(fmt = "the error type cannot be used here")]
    ErrorType,

    #[display(fmt = "the wildcard type cannot be used here")]
    WildcardType,

    #[display(fmt = "{} is not a sequence type and cannot be collected", ty)]
    CollectorNotSequence { ty: Type },

    #[display(fmt = "{} is not an interface", alias)]
    AliasNotInterface { alias: Type },

    #[display(fmt = "{} does not implement {}", ty, alias)]
    AliasNotImplemented { ty: Type, alias: Type },

    #[display(
        fmt = "parameter {} does not exist, the function takes {}",
        index,
        arity
    )]
    FakeParam { index: usize, arity: usize },

    #[display(fmt = "field `{}` does not exist", name)]
    FakeField { name: String },

    #[display(
        fmt = "output {} does not exist, the function has {}",
        index,
        count
    )]
    FakeOutput { index: usize, count: usize },

    #[display(fmt = "the function has no outputs")]
    NoOutputs,

    #[display(fmt = "{} is not an injectable struct", ty)]
    NotStruct { ty: Type },

    #[display(fmt = "the value is not of type {}", ty)]
    ValueTypeMismatch { ty: Type },

    #[display(
        fmt = "another component of type {} is named {:?} ({})",
        ty,
        name,
        first
    )]
    DuplicateComponent {
        ty: Type,
        name: String,
        first: SourceLocation,
    },
}

/// The part of a provider or consumer that has a problem.
#[derive(Clone, PartialEq, Eq, Debug, Display)]
pub enum Item {
    #[display(fmt = "provider")]
    Provider,

    #[display(fmt = "component {}", _0)]
    Component(usize),

    #[display(fmt = "{}", _0)]
    Dependency(Slot),

    #[display(fmt = "output {}", _0)]
    Output(usize),
}

/// A single validation problem.
#[derive(Clone, PartialEq, Eq, Debug, Display)]
#[display(fmt = "{}: {}", item, problem)]
pub struct Issue {
    item: Item,
    problem: Problem,
}

impl Issue {
    #[must_use]
    pub fn new(item: Item, problem: Problem) -> Self {
        Issue { item, problem }
    }

    #[must_use]
    pub fn item(&self) -> &Item {
        &self.item
    }

    #[must_use]
    pub fn problem(&self) -> &Problem {
        &self.problem
    }
}

/// Every issue found in one provider or consumer.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ProviderIssues {
    description: String,
    location: SourceLocation,
    issues: Vec<Issue>,
}

impl ProviderIssues {
    /// A description of the provider or consumer.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn location(&self) -> SourceLocation {
        self.location
    }

    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

/// All issues found while validating a module or consumer, grouped by the
/// directory of the source file each provider was declared in.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct ValidationErrors {
    groups: IndexMap<&'static str, Vec<ProviderIssues>>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        ValidationErrors::default()
    }

    /// Records the issues of a provider or consumer. Nothing is recorded if
    /// `issues` is empty.
    pub fn push(
        &mut self,
        description: impl Into<String>,
        location: SourceLocation,
        issues: Vec<Issue>,
    ) {
        if issues.is_empty() {
            return;
        }

        self.groups
            .entry(location.directory())
            .or_default()
            .push(ProviderIssues {
                description: description.into(),
                location,
                issues,
            });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The groups of issues, keyed by directory.
    pub fn groups(
        &self,
    ) -> impl Iterator<Item = (&'static str, &[ProviderIssues])> + '_ {
        self.groups
            .iter()
            .map(|(directory, providers)| (*directory, providers.as_slice()))
    }

    /// Every issue, in the order it was recorded.
    pub fn issues(&self) -> impl Iterator<Item = &Issue> + '_ {
        self.groups
            .values()
            .flatten()
            .flat_map(|provider| provider.issues.iter())
    }

    pub(crate) fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl FmtDisplay for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed")?;
        for (directory, providers) in &self.groups {
            write!(f, "\n{}:", directory)?;
            for provider in providers {
                write!(f, "\n  {} ({}):", provider.description, provider.location)?;
                for issue in &provider.issues {
                    write!(f, "\n    - {}", issue)?;
                }
            }
        }

        Ok(())
    }
}
