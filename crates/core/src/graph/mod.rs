#![forbid(unsafe_code)]

mod dedup;
mod state;
mod types;

pub use dedup::*;
pub use state::*;
pub use types::*;
