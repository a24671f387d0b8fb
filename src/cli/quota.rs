//! CLI command: `tollgate quota`
//!
//! Displays today's request count against the daily limit.

use anyhow::Result;
use clap::Subcommand;
use tollgate_governor::{format_quota_stats, QuotaCounter};

#[derive(Subcommand, Debug)]
pub enum QuotaCommands {
    /// Show today's usage
    Status {
        /// Print JSON for scripting
        #[arg(long)]
        json: bool,
        /// Refresh every 2 seconds
        #[arg(long, conflicts_with = "json")]
        watch: bool,
    },
    /// Start today's counter from zero
    Reset,
}

/// Run the quota subcommand.
pub async fn run(counter: &QuotaCounter, cmd: QuotaCommands) -> Result<()> {
    match cmd {
        QuotaCommands::Status { watch: true, .. } => run_watch(counter).await,
        QuotaCommands::Status { json: true, .. } => run_json(counter),
        QuotaCommands::Status { .. } => {
            print_table(counter);
            Ok(())
        }
        QuotaCommands::Reset => {
            counter.reset()?;
            println!("Quota counter reset.");
            Ok(())
        }
    }
}

/// Pretty-printed output.
pub fn print_table(counter: &QuotaCounter) {
    println!("{}", format_quota_stats(&counter.stats()));
}

/// JSON output for scripting.
fn run_json(counter: &QuotaCounter) -> Result<()> {
    // Not can_proceed(): a status read must not consume a threshold notice
    println!("{}", serde_json::to_string_pretty(&counter.stats())?);
    Ok(())
}

/// Watch mode: refresh display every 2 seconds.
async fn run_watch(counter: &QuotaCounter) -> Result<()> {
    loop {
        // Clear screen
        print!("\x1b[2J\x1b[H");
        print_table(counter);
        println!("  (refreshing every 2s, Ctrl+C to exit)");
        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
    }
}
