mod interface;
mod service;
mod set;
mod symbol;
mod ty;

pub use interface::*;
pub use service::*;
pub use set::*;
pub use symbol::*;
pub use ty::*;
