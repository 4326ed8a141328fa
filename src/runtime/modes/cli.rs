//! CLI mode
//!
//! Delegates to the command implementations in `interfaces::cli`.

use crate::cli::Commands;
use crate::config::StaticConfig;
use crate::errors::Result;

pub async fn run_cli(cmd: Commands, config: &StaticConfig) -> Result<()> {
    crate::interfaces::cli::run_cli_command(cmd, config).await
}
