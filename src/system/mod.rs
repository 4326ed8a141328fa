//! System-level modules
//!
//! Process-wide setup that does not belong to any single feature.

pub mod logging;

pub use logging::init_logging;
