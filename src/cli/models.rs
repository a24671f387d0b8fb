//! CLI command: `tollgate models`
//!
//! Displays the free model pool ranked by today's success rate.

use anyhow::Result;
use clap::Subcommand;
use tollgate_governor::{format_availability, AvailabilityTracker};

#[derive(Subcommand, Debug)]
pub enum ModelsCommands {
    /// Show the pool overview and top models
    Status {
        /// Print JSON for scripting
        #[arg(long)]
        json: bool,
    },
    /// List the best available models
    Best {
        /// Number of models (defaults to availability.default_rank_count)
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Forget all model statistics
    Reset,
}

pub fn run(tracker: &AvailabilityTracker, cmd: ModelsCommands) -> Result<()> {
    match cmd {
        ModelsCommands::Status { json: true } => {
            let output = serde_json::json!({
                "overview": tracker.overview(),
                "available": tracker.available(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        ModelsCommands::Status { json: false } => print_status(tracker),
        ModelsCommands::Best { count } => {
            let best = match count {
                Some(n) => tracker.ranked_available(n),
                None => tracker.best(),
            };
            if best.is_empty() {
                println!("No available models.");
            }
            for (idx, model) in best.iter().enumerate() {
                println!(
                    "{}. {} ({:.1}%, {}/{})",
                    idx + 1,
                    model.id,
                    model.success_rate * 100.0,
                    model.successful_requests,
                    model.requests
                );
            }
        }
        ModelsCommands::Reset => {
            tracker.reset()?;
            println!("Model statistics reset.");
        }
    }
    Ok(())
}

pub fn print_status(tracker: &AvailabilityTracker) {
    println!("{}", format_availability(&tracker.overview(), &tracker.available()));
}
