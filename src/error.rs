#![allow(clippy::used_underscore_binding)]

use crate::{SourceLocation, ValidationErrors};
use derive_more::Display;
use std::error::Error;

/// A boxed error returned by a user function.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// A result from attempting to resolve dependencies or construct values.
pub type InjectResult<T> = Result<T, InjectError>;

/// An error which occurred while building a container, planning a request or
/// executing a plan.
#[derive(Debug, Display)]
pub enum InjectError {
    /// A module, provider or consumer failed validation.
    #[display(fmt = "{}", _0)]
    Validation(ValidationErrors),

    /// No component matches a dependency.
    #[display(fmt = "{} has no matching component ({})", dependency, location)]
    MissingDependency {
        dependency: String,
        location: SourceLocation,
    },

    /// More than one component matches a dependency which requires exactly
    /// one.
    #[display(
        fmt = "{} matches {} components ({}): [{}]",
        dependency,
        "candidates.len()",
        location,
        "candidates.join(\", \")"
    )]
    UncertainDependency {
        dependency: String,
        location: SourceLocation,
        candidates: Vec<String>,
    },

    /// A component depends on itself, directly or transitively.
    #[display(
        fmt = "a cycle was detected while resolving {} ({}): [{}]",
        dependency,
        location,
        "cycle.join(\" -> \")"
    )]
    CyclicDependency {
        dependency: String,
        location: SourceLocation,
        cycle: Vec<String>,
    },

    /// A provider lives in a scope which is not on the active scope stack.
    #[display(
        fmt = "{} needs scope {} which is not active ({})",
        provider,
        scope,
        location
    )]
    ScopeNotActive {
        provider: String,
        scope: String,
        location: SourceLocation,
    },

    /// A scope cannot be entered directly from the current scope.
    #[display(fmt = "scope {} cannot be entered from scope {}", scope, current)]
    ScopeNotEnterable { scope: String, current: String },

    /// A scope was left while it was not the innermost active scope.
    #[display(fmt = "scope {} cannot be left while {} is current", scope, current)]
    ScopeNotCurrent { scope: String, current: String },

    /// A provider failed while its value was being produced.
    #[display(fmt = "{} failed ({}): {}", provider, location, inner)]
    ProviderFailed {
        provider: String,
        location: SourceLocation,
        inner: Box<InjectError>,
    },

    /// A user function returned an error.
    #[display(fmt = "{} returned an error: {}", function, inner)]
    FunctionFailed { function: String, inner: BoxError },

    /// A user function panicked.
    #[display(fmt = "{} panicked: {}", function, message)]
    FunctionPanicked { function: String, message: String },

    /// A resolved value could not be narrowed to the requested type.
    #[display(fmt = "expected {}, but found {}", expected, found)]
    TypeMismatch { expected: String, found: String },

    /// The operation was cancelled through its context.
    #[display(fmt = "the operation was cancelled")]
    Cancelled,

    /// Several errors occurred. Planning and validation report everything
    /// they find rather than stopping at the first problem.
    #[display(fmt = "{}", "fmt_errors(_0)")]
    Multiple(Vec<InjectError>),

    /// An unexpected error has occurred. This is usually caused by a bug in
    /// the library itself.
    #[display(
        fmt = "an unexpected error occurred (please report this): {}",
        _0
    )]
    InternalError(String),
}

impl InjectError {
    /// Combines errors into a single result. A single error is returned as
    /// is.
    pub(crate) fn aggregate(mut errors: Vec<InjectError>) -> InjectResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(InjectError::Multiple(errors)),
        }
    }

    /// Flattens [`InjectError::Multiple`] into the errors it contains.
    #[must_use]
    pub fn errors(&self) -> Vec<&InjectError> {
        match self {
            InjectError::Multiple(errors) => {
                errors.iter().flat_map(InjectError::errors).collect()
            }
            error => vec![error],
        }
    }

    /// Follows [`InjectError::ProviderFailed`] wrappers to the error that
    /// caused them.
    #[must_use]
    pub fn root_cause(&self) -> &InjectError {
        match self {
            InjectError::ProviderFailed { inner, .. } => inner.root_cause(),
            error => error,
        }
    }
}

impl Error for InjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InjectError::ProviderFailed { inner, .. } => Some(&**inner),
            InjectError::FunctionFailed { inner, .. } => Some(&**inner),
            _ => None,
        }
    }
}

fn fmt_errors(errors: &[InjectError]) -> String {
    let mut joined = format!("{} errors occurred:", errors.len());
    for error in errors {
        joined.push_str("\n  - ");
        joined.push_str(&error.to_string());
    }
    joined
}
