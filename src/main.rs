// Gradeexport - Course grade export to external grading systems
// Copyright (c) 2025 Gradeexport Contributors
// Licensed under the MIT License

use gradeexport::cli::commands::{exit_code, EXIT_FATAL};
use gradeexport::cli::{Cli, Commands};
use gradeexport::config::{load_config, LoggingConfig};
use gradeexport::logging::init_logging;
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging settings come from the config file when it loads; the CLI flag wins
    let file_config = load_config(&cli.config).ok();
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| file_config.as_ref().map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let logging_config = match (&cli.command, &file_config) {
        (Commands::Serve(_), Some(config)) => config.logging.clone(),
        _ => LoggingConfig::default(),
    };

    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_FATAL);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Gradeexport - Course grade export"
    );

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            exit_code(&e)
        }
    };

    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Report(args) => args.execute(&cli.config).await,
        Commands::Send(args) => args.execute(&cli.config).await,
        Commands::Action(args) => args.execute(&cli.config).await,
        Commands::Drivers(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
        Commands::Serve(args) => args.execute(&cli.config).await,
    }
}
