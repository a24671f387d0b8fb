//! CLI command: `tollgate budget`
//!
//! Displays the monetary budget and prices requests against it.

use anyhow::Result;
use clap::Subcommand;
use tollgate_governor::{format_budget_status, BudgetTracker};

#[derive(Subcommand, Debug)]
pub enum BudgetCommands {
    /// Show spend, expiry and the current advisory
    Status {
        /// Print JSON for scripting
        #[arg(long)]
        json: bool,
    },
    /// Zero the spend (keeps cap and expiry)
    Reset,
    /// Estimate the cost of a request without recording it
    Cost {
        /// Model name
        model: String,
        /// Input tokens
        input: u64,
        /// Output tokens
        output: u64,
    },
}

pub fn run(tracker: &BudgetTracker, cmd: BudgetCommands) -> Result<()> {
    match cmd {
        BudgetCommands::Status { json: true } => {
            let decision = tracker.check();
            let output = serde_json::json!({
                "allowed": decision.allowed,
                "notice": decision.notice,
                "budget": decision.snapshot,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        BudgetCommands::Status { json: false } => print_status(tracker),
        BudgetCommands::Reset => {
            tracker.reset()?;
            println!("Budget reset.");
        }
        BudgetCommands::Cost {
            model,
            input,
            output,
        } => {
            let cost = tracker.cost(&model, input, output);
            let fallback = tracker.config().prices.lookup(&model).fallback;
            println!(
                "{}: {:.6} {}{}",
                model,
                cost,
                tracker.config().currency,
                if fallback { " (default price)" } else { "" }
            );
        }
    }
    Ok(())
}

pub fn print_status(tracker: &BudgetTracker) {
    println!("{}", format_budget_status(&tracker.check()));
}
