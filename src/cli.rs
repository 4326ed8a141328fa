//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// Referral landing service
#[derive(Parser, Debug)]
#[command(name = "referral-landing")]
#[command(version)]
#[command(about = "Referral attribution and redirect resolution service", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Resolve a landing URL and print the redirect decision
    ///
    /// Usage: resolve "/?ref_campaign=12&cabinet=1"
    Resolve {
        /// Path with optional query, or an absolute URL
        url: String,

        /// Force cabinet mode (adds cabinet=1)
        #[arg(long)]
        cabinet: bool,
    },

    /// Fetch a referral profile and print the cabinet view
    Profile {
        /// Referral token (e.g. "anna" or "cmp12")
        token: String,

        /// Report period: 7d, 30d, 90d, all
        #[arg(long)]
        period: Option<String>,

        /// Read profiles from a JSON fixture instead of the backend
        #[arg(long)]
        fixture: Option<String>,

        /// Copy the referral link to the clipboard
        #[arg(long)]
        copy: bool,

        /// Share the referral link (falls back to the clipboard)
        #[arg(long, conflicts_with = "copy")]
        share: bool,
    },

    /// Export a QR code for a referral link as SVG
    Qr {
        /// Referral token
        token: String,

        /// Output directory (default: cabinet.qr_output_dir)
        #[arg(long)]
        out: Option<String>,

        /// Read profiles from a JSON fixture instead of the backend
        #[arg(long)]
        fixture: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite existing file
        #[arg(long)]
        force: bool,
    },
}
