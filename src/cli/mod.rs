//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for gradeexport using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Gradeexport - export course grades to external grading systems
#[derive(Parser, Debug)]
#[command(name = "gradeexport")]
#[command(version, about, long_about = None)]
#[command(author = "Gradeexport Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "gradeexport.toml", env = "GRADEEXPORT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "GRADEEXPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the export report of a course
    Report(commands::report::ReportArgs),

    /// Send selected grades to the external system
    Send(commands::send::SendArgs),

    /// Run a driver action and save its output
    Action(commands::action::ActionArgs),

    /// List registered drivers and their selection order
    Drivers(commands::drivers::DriversArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Serve export pages over HTTP
    Serve(commands::serve::ServeArgs),
}
