//! Command-line interface for echallan.
//!
//! This module provides the CLI structure for the `echallan` binary. The
//! command handlers live in `main.rs`.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AnalyticsCommand, ConfigCommand, DriverCommand, MatchCommand, SeedCommand, ServeCommand,
    StatusCommand,
};

/// echallan - RTO face-scan kiosk backend
///
/// Serves driver records, face matching, e-challan memos, and daily
/// analytics to the kiosk frontend, and inspects the same store offline.
#[derive(Debug, Parser)]
#[command(name = "echallan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeCommand),

    /// Seed empty tables with reference data and drivers
    Seed(SeedCommand),

    /// Show database location and record counts
    Status(StatusCommand),

    /// Print a driver record
    Driver(DriverCommand),

    /// Match a face descriptor against stored drivers
    Match(MatchCommand),

    /// Show today's analytics
    Analytics(AnalyticsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    fn status_cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "echallan");
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(status_cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(status_cli(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(status_cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(status_cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(status_cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["echallan", "serve", "--host", "0.0.0.0", "-p", "8080"])
            .unwrap();
        match cli.command {
            Command::Serve(cmd) => {
                assert_eq!(cmd.host.as_deref(), Some("0.0.0.0"));
                assert_eq!(cmd.port, Some(8080));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["echallan", "serve"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Serve(ServeCommand {
                host: None,
                port: None
            })
        ));
    }

    #[test]
    fn test_parse_seed() {
        let cli = Cli::try_parse_from(["echallan", "seed", "--drivers", "10"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Seed(SeedCommand { drivers: Some(10) })
        ));
    }

    #[test]
    fn test_parse_driver() {
        let cli = Cli::try_parse_from(["echallan", "driver", "GJ001", "--json"]).unwrap();
        match cli.command {
            Command::Driver(cmd) => {
                assert_eq!(cmd.id, "GJ001");
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_match() {
        let cli = Cli::try_parse_from([
            "echallan",
            "match",
            "probe.json",
            "--demo-driver",
            "GJ002",
        ])
        .unwrap();
        match cli.command {
            Command::Match(cmd) => {
                assert_eq!(cmd.file, PathBuf::from("probe.json"));
                assert_eq!(cmd.demo_driver.as_deref(), Some("GJ002"));
                assert!(!cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_match_requires_file() {
        assert!(Cli::try_parse_from(["echallan", "match"]).is_err());
    }

    #[test]
    fn test_parse_analytics_refresh() {
        let cli = Cli::try_parse_from(["echallan", "analytics", "-r"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Analytics(AnalyticsCommand {
                refresh: true,
                json: false
            })
        ));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli =
            Cli::try_parse_from(["echallan", "config", "validate", "--file", "x.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from(["echallan", "status", "-c", "/custom/config.toml", "-vv"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }
}
