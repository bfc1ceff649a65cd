#![forbid(unsafe_code)]

mod artifact;
mod engine;
mod identity;
mod remote;
mod sanitize;

pub use artifact::*;
pub use engine::*;
pub use identity::*;
pub use remote::*;
pub use sanitize::*;
