//! CLI interface module
//!
//! One-shot commands that exercise the landing pipeline without the HTTP server.

pub mod commands;

use crate::cli::{Commands, ConfigCommands};
use crate::config::StaticConfig;
use crate::errors::Result;
use commands::{LinkAction, config_generate, export_qr, resolve_url, show_profile};

/// Run a CLI command from clap-parsed input
///
/// `Serve` is handled by the server mode and is a no-op here.
pub async fn run_cli_command(cmd: Commands, config: &StaticConfig) -> Result<()> {
    match cmd {
        Commands::Serve => Ok(()),
        Commands::Resolve { url, cabinet } => resolve_url(&url, cabinet, config),
        Commands::Profile {
            token,
            period,
            fixture,
            copy,
            share,
        } => {
            let action = if share {
                Some(LinkAction::Share)
            } else if copy {
                Some(LinkAction::Copy)
            } else {
                None
            };
            show_profile(&token, period.as_deref(), fixture.as_deref(), action, config).await
        }
        Commands::Qr {
            token,
            out,
            fixture,
        } => export_qr(&token, out.as_deref(), fixture.as_deref(), config).await,
        Commands::Config { action } => match action {
            ConfigCommands::Generate { output_path, force } => {
                config_generate(output_path, force).await
            }
        },
    }
}
