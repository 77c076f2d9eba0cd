//! Domain models for the simili system.

mod medication;
mod resolution;
mod tier;

pub use medication::*;
pub use resolution::*;
pub use tier::*;
