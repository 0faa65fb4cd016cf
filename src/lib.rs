//! Runtime dependency injection with scopes, qualifiers and collectors.
//!
//! By default, services are held in `Arc<T>` and containers can be shared
//! between threads. This can be changed by disabling default features and
//! enabling the "rc" feature, in which case `Rc<T>` is used instead:
//!
//! ```text
//! runtime_resolver = {
//!     version = "*",
//!     default_features = false,
//!     features = ["rc"]
//! }
//! ```
//!
//! # Providers, components and consumers
//!
//! A [`Provider`] describes how to produce values: a constant, a function
//! whose parameters are injected, or a struct whose fields are injected.
//! Each value a provider produces is a [`Component`], which has a type and
//! can be qualified with a name and tags. Anything that asks for values is a
//! [`Consumer`], and each of its requests is a [`Dependency`].
//!
//! Providers are grouped into a [`Module`], which is validated and indexed
//! when a [`Container`] is created from it. Requests made to the container
//! are first planned, which reports every missing, ambiguous or cyclic
//! dependency at once, and then executed.
//!
//! # Scopes
//!
//! Every provider lives in a [`Scope`]. Scopes form a graph rooted at the
//! global scope, and a consumer can only see components provided in its own
//! scope or one of its ancestors. Values are memoised per active scope in the
//! [`Ctx`] passed to each operation, so leaving a scope discards everything
//! produced in it.
//!
//! # Example
//!
//! ```
//! use runtime_resolver::{
//!     interface, Container, Consumer, Ctx, DependencyBuilder, Module,
//!     Provider, Scope, Service, Svc,
//! };
//!
//! trait Store: Service {
//!     fn name(&self) -> &'static str;
//! }
//!
//! struct MemoryStore;
//! impl Store for MemoryStore {
//!     fn name(&self) -> &'static str {
//!         "memory"
//!     }
//! }
//!
//! interface!(Store = [MemoryStore]);
//!
//! struct Session {
//!     store: Svc<dyn Store>,
//!     user: Svc<String>,
//! }
//!
//! fn open_session(store: Svc<dyn Store>, user: Svc<String>) -> Session {
//!     Session { store, user }
//! }
//!
//! let request = Scope::new("request");
//! let module = Module::builder()
//!     .provide(Provider::value(MemoryStore).alias::<dyn Store>())
//!     .provide(Provider::value("admin".to_owned()).name("user"))
//!     .provide(
//!         Provider::func(open_session)
//!             .param(1, DependencyBuilder::new().by_name("user"))
//!             .in_scope(request.clone()),
//!     )
//!     .build();
//! let container = Container::new(module).unwrap();
//!
//! let ctx = Ctx::new().enter_scope(&request).unwrap();
//! let session: Svc<Session> = container
//!     .value_of(&ctx, Consumer::value())
//!     .unwrap();
//! assert_eq!("memory", session.store.name());
//! assert_eq!("admin", session.user.as_str());
//!
//! // The session is memoised for as long as the scope is active.
//! let again: Svc<Session> = container.value_of(&ctx, Consumer::value()).unwrap();
//! assert!(Svc::ptr_eq(&session, &again));
//! ```

#![forbid(unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::needless_pass_by_value
)]

#[cfg(not(any(feature = "arc", feature = "rc")))]
compile_error!(
    "Either the 'arc' or 'rc' feature must be enabled (but not both)."
);

#[cfg(all(feature = "arc", feature = "rc"))]
compile_error!(
    "The 'arc' and 'rc' features are mutually exclusive and cannot be enabled together."
);

mod builder;
mod container;
mod context;
mod engine;
mod error;
mod location;
mod model;
mod planner;
mod repository;
mod scope;
mod types;
mod values;

pub use builder::*;
pub use container::*;
pub use context::*;
pub use error::*;
pub use location::*;
pub use model::*;
pub use planner::{Binding, Plan, Resolution};
pub use repository::*;
pub use scope::*;
pub use types::*;
pub use values::*;

#[cfg(test)]
mod tests;
