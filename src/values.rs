mod func;
mod request;
mod structs;
mod value;
mod valuer;

pub use func::*;
pub use request::*;
pub use structs::*;
pub use value::*;
pub use valuer::*;
