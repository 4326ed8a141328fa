//! Mode routing
//!
//! - Server mode (HTTP server, default)
//! - CLI mode (one-shot commands)

pub mod cli;
#[cfg(feature = "server")]
pub mod server;

pub use cli::run_cli;
#[cfg(feature = "server")]
pub use server::run_server;
