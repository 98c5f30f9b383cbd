//! `echallan` - CLI for the RTO kiosk backend
//!
//! This binary runs the HTTP API and offers offline access to the same
//! database: seeding, driver lookup, face matching, and analytics.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;

use echallan::cli::{
    AnalyticsCommand, Cli, Command, ConfigCommand, DriverCommand, MatchCommand, SeedCommand,
    ServeCommand,
};
use echallan::server::{self, AppState};
use echallan::storage::SeedOptions;
use echallan::{init_logging, Config, FaceDescriptor, FaceMatcher, Storage};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    run(cli)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Loaded per command so `config path` and `config validate` still work
    // when the config file is broken.
    let load = || Config::load_from(cli.config.clone());

    match cli.command {
        Command::Serve(cmd) => handle_serve(load()?, cmd),
        Command::Seed(cmd) => handle_seed(&load()?, &cmd),
        Command::Status(cmd) => handle_status(&load()?, cmd.json),
        Command::Driver(cmd) => handle_driver(&load()?, &cmd),
        Command::Match(cmd) => handle_match(&load()?, &cmd),
        Command::Analytics(cmd) => handle_analytics(&load()?, &cmd),
        Command::Config(cmd) => handle_config(cli.config.clone(), cmd),
    }
}

fn open_database(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening {}", path.display()))
}

/// Open the database, seeding empty tables first when `seed_on_open` is set.
fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let storage = open_database(config)?;
    if config.storage.seed_on_open {
        storage.seed(seed_options(config, None))?;
    }
    Ok(storage)
}

fn seed_options(config: &Config, drivers: Option<u32>) -> SeedOptions {
    SeedOptions {
        random_drivers: drivers.unwrap_or(config.storage.random_drivers),
        rng_seed: config.storage.seed_rng,
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(host) = cmd.host {
        config.server.host = host;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.validate()?;

    let state = AppState::from_config(config)?;
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(server::serve(state))?;
    Ok(())
}

fn handle_seed(config: &Config, cmd: &SeedCommand) -> anyhow::Result<()> {
    let storage = open_database(config)?;
    let report = storage.seed(seed_options(config, cmd.drivers))?;

    if report.is_empty() {
        println!("All tables already seeded; nothing to do.");
    } else {
        println!("Seeded {}", storage.path().display());
        println!("  Drivers:    {}", report.drivers);
        println!("  Violations: {}", report.violations);
        println!("  Districts:  {}", report.districts);
        println!("  Cities:     {}", report.cities);
        println!("  Cameras:    {}", report.cameras);
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "stats": stats,
        });
        print_json(&status)?;
    } else {
        println!("echallan status");
        println!("---------------");
        println!("Database:      {}", storage.path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!(
            "Drivers:       {} ({} enrolled)",
            stats.drivers, stats.enrolled_drivers
        );
        println!("Violations:    {}", stats.violations);
        println!("Memos:         {}", stats.memos);
        println!("Snapshots:     {}", stats.analytics_snapshots);
    }
    Ok(())
}

fn handle_driver(config: &Config, cmd: &DriverCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let Some(driver) = storage.get_driver(&cmd.id)? else {
        bail!("Driver not found: {}", cmd.id);
    };

    if cmd.json {
        return print_json(&driver);
    }

    println!("{} ({})", driver.name, driver.id);
    println!("  {}:  {}", driver.govt_id_type, driver.govt_id_number);
    println!("  License:   {} (expires {})", driver.license_number, driver.license_expiry);
    println!("  Vehicle:   {} ({})", driver.vehicle_number, driver.vehicle_type);
    println!("  Father:    {}", driver.father_name);
    println!("  Born:      {} ({})", driver.dob, driver.blood_group);
    println!("  Address:   {}", driver.address);
    println!("  Phone:     {}", driver.phone);
    println!(
        "  Enrolled:  {}",
        if driver.face_descriptor.is_some() { "yes" } else { "no" }
    );

    let memos = storage.memos_for_driver(&driver.id)?;
    if !memos.is_empty() {
        println!();
        println!("Memos:");
        for memo in memos {
            println!(
                "  {}  {}  Rs {}  {}",
                memo.id, memo.date, memo.total_fine, memo.payment_status
            );
        }
    }
    Ok(())
}

fn handle_match(config: &Config, cmd: &MatchCommand) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&cmd.file)
        .with_context(|| format!("reading {}", cmd.file.display()))?;
    let descriptor: FaceDescriptor = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of numbers", cmd.file.display()))?;

    let expected = config.matching.descriptor_len;
    if descriptor.len() != expected {
        bail!(
            "descriptor must have {expected} components, got {}",
            descriptor.len()
        );
    }

    let storage = open_storage(config)?;
    let matcher = FaceMatcher::new(storage.driver_summaries()?, &config.matching);

    let Some(found) = matcher.find_best_match(&descriptor, cmd.demo_driver.as_deref()) else {
        bail!("No match");
    };

    if cmd.json {
        return print_json(&found);
    }

    println!(
        "{} ({})  distance {:.4}  [{:?}]",
        found.driver.name, found.driver.id, found.distance, found.kind
    );
    Ok(())
}

fn handle_analytics(config: &Config, cmd: &AnalyticsCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let now = Utc::now();
    let snapshot = if cmd.refresh {
        storage.refresh_analytics(now)?
    } else {
        storage.analytics(now)?
    };

    if cmd.json {
        return print_json(&snapshot);
    }

    println!("Analytics for {}", snapshot.date);
    println!("=======================");
    println!("Memos issued:    {}", snapshot.today_violations);
    println!("Total fines:     Rs {}", snapshot.total_fines);
    println!("Active officers: {}", snapshot.active_officers);
    println!(
        "Payments:        {} paid, {} pending",
        snapshot.payment_stats.paid, snapshot.payment_stats.pending
    );
    if !snapshot.violation_breakdown.is_empty() {
        println!();
        println!("[Violations]");
        for (name, count) in &snapshot.violation_breakdown {
            println!("  {name}: {count}");
        }
    }
    println!();
    println!("Last updated: {}", snapshot.last_updated);
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                print_json(&config)?;
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Host:               {}", config.server.host);
                println!("  Port:               {}", config.server.port);
                match &config.server.static_dir {
                    Some(dir) => println!("  Static dir:         {}", dir.display()),
                    None => println!("  Static dir:         (none)"),
                }
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Seed on open:       {}", config.storage.seed_on_open);
                println!("  Random drivers:     {}", config.storage.random_drivers);
                println!();
                println!("[Matching]");
                println!("  Threshold:          {}", config.matching.threshold);
                println!("  Demo fallback:      {}", config.matching.demo_fallback);
                println!("  Demo distance:      {}", config.matching.demo_distance);
                println!("  Descriptor length:  {}", config.matching.descriptor_len);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broken_config() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = \"not a number\"\n").unwrap();
        (dir, path)
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_config_validate_reports_broken_file() {
        let (_dir, path) = broken_config();
        let path = path.to_str().unwrap();

        assert!(run(parse(&["echallan", "-c", path, "config", "validate"])).is_ok());
        assert!(run(parse(&["echallan", "config", "validate", "--file", path])).is_ok());
        assert!(run(parse(&["echallan", "-c", path, "config", "path"])).is_ok());
    }

    #[test]
    fn test_other_commands_fail_on_broken_config() {
        let (_dir, path) = broken_config();
        let path = path.to_str().unwrap();

        assert!(run(parse(&["echallan", "-c", path, "config", "show"])).is_err());
        assert!(run(parse(&["echallan", "-c", path, "status"])).is_err());
    }
}
