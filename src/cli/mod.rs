//! Command line surface
//!
//! Each subcommand lives in [`commands`] and returns a process exit code.

pub mod commands;

use clap::{Parser, Subcommand};

/// Vitex - Vital-sign measurement export engine
#[derive(Parser, Debug)]
#[command(name = "vitex")]
#[command(version, about, long_about = None)]
#[command(author = "Vitex Contributors")]
pub struct Cli {
    /// Configuration file to load
    #[arg(short, long, default_value = "vitex.toml", env = "VITEX_CONFIG")]
    pub config: String,

    /// Override `application.log_level`
    #[arg(short, long, env = "VITEX_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export new measurements to the configured backend
    Export(commands::export::ExportArgs),

    /// Retry temporarily failed measurements and give up on expired ones
    RetryFailed(commands::export::RetryFailedArgs),

    /// Show export totals, run history and endpoint health
    Status(commands::status::StatusArgs),

    /// Serve the HTTP status and export endpoints
    Serve(commands::serve::ServeArgs),

    /// Apply the PostgreSQL schema
    Migrate(commands::migrate::MigrateArgs),

    /// Load the configuration and report problems without running anything
    ValidateConfig(commands::validate::ValidateArgs),

    /// Write a sample vitex.toml
    Init(commands::init::InitArgs),
}
