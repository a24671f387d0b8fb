//! CLI module for Tollgate
//!
//! Presentation shim over the trackers:
//! - `quota`: daily request quota status and reset
//! - `budget`: budget status, reset and cost estimates
//! - `models`: free model availability and ranking
//! - `status`: all three reports

use crate::config::{load_config, AppConfig};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tollgate_core::{SharedClock, SystemClock};
use tollgate_governor::{AvailabilityTracker, BudgetTracker, QuotaCounter};
use tracing::debug;

pub mod budget;
pub mod models;
pub mod quota;

/// Tollgate usage governor CLI
#[derive(Parser, Debug)]
#[command(name = "tollgate")]
#[command(about = "Quota, budget and availability tracking for rate-limited APIs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Daily request quota
    Quota {
        #[command(subcommand)]
        command: quota::QuotaCommands,
    },
    /// Monetary budget
    Budget {
        #[command(subcommand)]
        command: budget::BudgetCommands,
    },
    /// Free model availability
    Models {
        #[command(subcommand)]
        command: models::ModelsCommands,
    },
    /// Show quota, budget and model reports
    Status,
}

/// Trackers opened on the configured ledger files
pub struct Trackers {
    pub quota: QuotaCounter,
    pub budget: BudgetTracker,
    pub availability: AvailabilityTracker,
}

impl Trackers {
    /// Open every tracker with the system clock
    pub fn open(config: &AppConfig) -> Self {
        let clock: SharedClock = Arc::new(SystemClock);
        debug!(data_dir = ?config.data_dir(), "Opening ledgers");

        Self {
            quota: QuotaCounter::new(config.quota_path(), config.quota.clone(), clock.clone()),
            budget: BudgetTracker::new(config.budget_path(), config.budget.clone(), clock.clone()),
            availability: AvailabilityTracker::new(
                config.availability_path(),
                config.availability.clone(),
                clock,
            ),
        }
    }
}

/// Run the CLI command
pub async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config().context("Failed to load configuration")?;
    let trackers = Trackers::open(&config);

    match command {
        Commands::Quota { command } => quota::run(&trackers.quota, command).await,
        Commands::Budget { command } => budget::run(&trackers.budget, command),
        Commands::Models { command } => models::run(&trackers.availability, command),
        Commands::Status => {
            quota::print_table(&trackers.quota);
            println!();
            budget::print_status(&trackers.budget);
            println!();
            models::print_status(&trackers.availability);
            Ok(())
        }
    }
}
