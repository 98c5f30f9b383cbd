//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to bind (overrides `server.host`)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides `server.port`)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Seed command arguments.
#[derive(Debug, Args)]
pub struct SeedCommand {
    /// Number of generated drivers (overrides `storage.random_drivers`)
    #[arg(short, long)]
    pub drivers: Option<u32>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Driver lookup arguments.
#[derive(Debug, Args)]
pub struct DriverCommand {
    /// Driver id, e.g. GJ001
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Face match arguments.
#[derive(Debug, Args)]
pub struct MatchCommand {
    /// File holding the probe descriptor as a JSON array of numbers
    pub file: PathBuf,

    /// Driver to return if nobody is within the threshold
    #[arg(short, long, value_name = "ID")]
    pub demo_driver: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Analytics command arguments.
#[derive(Debug, Args)]
pub struct AnalyticsCommand {
    /// Recompute and store a new snapshot first
    #[arg(short, long)]
    pub refresh: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
