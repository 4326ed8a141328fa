use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use referral_landing::cli::{Cli, Commands};
use referral_landing::config::{LoggingConfig, StaticConfig};
use referral_landing::runtime::{run_cli, run_server};
use referral_landing::system::init_logging;

#[actix_web::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match StaticConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            return ExitCode::FAILURE;
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let _guard = match init_logging(&config.logging) {
                Ok(guard) => guard,
                Err(e) => {
                    eprintln!("{}", e.format_colored());
                    return ExitCode::FAILURE;
                }
            };

            if let Err(e) = run_server(&config).await {
                error!("Server exited with error: {:#}", e);
                eprintln!("Server error: {:#}", e);
                return ExitCode::FAILURE;
            }
        }
        cmd => {
            // CLI 输出在 stdout，日志只保留警告
            let logging = LoggingConfig {
                level: "warn".to_string(),
                file: None,
                ..config.logging.clone()
            };
            let _guard = init_logging(&logging).ok();

            if let Err(e) = run_cli(cmd, &config).await {
                eprintln!("{}", e.format_colored());
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
