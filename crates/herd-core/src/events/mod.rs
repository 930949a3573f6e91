//! Event System
//!
//! Event recorders and the numbering stream. The record types live in the
//! `herd-events` crate.

pub mod logger;

pub use logger::*;
