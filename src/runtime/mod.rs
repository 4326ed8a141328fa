//! Application lifecycle and execution modes

pub mod lifetime;
pub mod modes;

pub use modes::run_cli;
#[cfg(feature = "server")]
pub use modes::run_server;
