//! Output Generation
//!
//! Run statistics.

pub mod stats;

pub use stats::*;
