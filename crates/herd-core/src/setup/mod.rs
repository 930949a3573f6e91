//! World Setup
//!
//! Population spawning and roster queries.

pub mod population;

pub use population::*;
