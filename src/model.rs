mod component;
mod consumer;
mod criteria;
mod dependency;
mod module;
mod provider;
mod validate;

pub use component::*;
pub use consumer::*;
pub use criteria::*;
pub use dependency::*;
pub use module::*;
pub use provider::*;
pub use validate::*;
