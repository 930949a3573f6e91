//! ECS Components
//!
//! Components for population members and the virus resource.

pub mod individual;
pub mod virus;

pub use individual::*;
pub use virus::*;
