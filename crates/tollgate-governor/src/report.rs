//! Reporting - Human-readable views of tracker state
//!
//! Pure presentation: every function takes a snapshot and returns text.

use crate::availability::{AvailabilityOverview, ResourceStats};
use crate::budget::BudgetSnapshot;
use crate::governor::Decision;
use crate::quota::QuotaStats;
use chrono::{DateTime, Local, Utc};
use std::fmt::Write;

/// Cells in the quota progress bar
pub const QUOTA_BAR_WIDTH: usize = 30;

/// Cells in the budget progress bar
pub const BUDGET_BAR_WIDTH: usize = 20;

/// Resources listed in the availability report
pub const AVAILABILITY_TOP_N: usize = 5;

/// Characters of a resource name shown in the availability report
const RESOURCE_NAME_WIDTH: usize = 30;

const RULE_WIDTH: usize = 44;

// ============================================================================
// Progress Bars
// ============================================================================

fn bar(filled: usize, width: usize) -> String {
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn cells(percentage: f64, width: usize) -> f64 {
    (percentage.clamp(0.0, 100.0) / 100.0) * width as f64
}

/// Quota bar with a traffic-light marker (red from 95%, yellow from 80%)
#[must_use]
pub fn quota_bar(percentage: f64) -> String {
    let marker = if percentage >= 95.0 {
        "🔴"
    } else if percentage >= 80.0 {
        "🟡"
    } else {
        "🟢"
    };
    let filled = cells(percentage, QUOTA_BAR_WIDTH).floor() as usize;
    format!(
        "{} [{}] {:.1}%",
        marker,
        bar(filled, QUOTA_BAR_WIDTH),
        percentage
    )
}

/// Budget bar, rounded to the nearest cell
#[must_use]
pub fn budget_bar(percentage: f64) -> String {
    let filled = cells(percentage, BUDGET_BAR_WIDTH).round() as usize;
    format!("[{}] {:.1}%", bar(filled, BUDGET_BAR_WIDTH), percentage)
}

// ============================================================================
// Reports
// ============================================================================

/// Today's request usage
#[must_use]
pub fn format_quota_stats(stats: &QuotaStats) -> String {
    let rule = "━".repeat(RULE_WIDTH);
    let mut output = String::new();

    let _ = writeln!(output, "📊 Request Usage ({})", stats.day);
    let _ = writeln!(output, "{}", rule);
    let _ = writeln!(output, "{}", quota_bar(stats.percentage));
    let _ = writeln!(
        output,
        "✅ Used:       {} requests",
        format_number_with_commas(stats.used)
    );
    let _ = writeln!(
        output,
        "⏳ Remaining:  {} requests",
        format_number_with_commas(stats.remaining)
    );
    let _ = writeln!(
        output,
        "📈 Limit:      {} requests/day",
        format_number_with_commas(stats.limit)
    );
    if stats.total_units > 0 {
        let _ = writeln!(
            output,
            "🔢 Units:      {}",
            format_compact_number(stats.total_units)
        );
    }
    if let Some(last) = stats.last_request_at {
        let _ = writeln!(output, "🕒 Last:       {}", local_time(last));
    }
    let _ = writeln!(
        output,
        "🔄 Resets in:  {}",
        format_duration(&chrono::Duration::seconds(stats.resets_in_secs))
    );
    output.push_str(&rule);

    output
}

/// Budget state plus the advisory of the last check
#[must_use]
pub fn format_budget_status(decision: &Decision<BudgetSnapshot>) -> String {
    let b = &decision.snapshot;
    let mut output = String::new();

    output.push_str("💰 Budget Status\n\n");
    let _ = writeln!(
        output,
        "Remaining:   {:.2} {cur} / {:.2} {cur} ({:.1}%)",
        b.remaining,
        b.total,
        b.percentage,
        cur = b.currency
    );
    let _ = writeln!(output, "Spent:       {:.2} {}", b.spent, b.currency);
    let _ = writeln!(output, "Requests:    {}", b.request_count);
    let _ = writeln!(
        output,
        "Valid until: {} ({} days)",
        b.valid_until, b.days_remaining
    );
    let _ = writeln!(output, "\nUsage: {}", budget_bar(b.percentage));

    if let Some(notice) = &decision.notice {
        let _ = writeln!(output, "\n{}", notice);
    }

    if let (Some(avg), Some(estimate)) = (b.average_cost, b.estimated_remaining_requests) {
        let _ = writeln!(output, "\nAvg per request:    {:.4} {}", avg, b.currency);
        let _ = writeln!(output, "Est. requests left: ~{}", estimate);
    }

    output
}

/// Pool overview and the top ranked resources
#[must_use]
pub fn format_availability(overview: &AvailabilityOverview, ranked: &[ResourceStats]) -> String {
    let rule = "-".repeat(60);
    let mut output = String::new();

    let _ = writeln!(output, "  Free Model Availability");
    let _ = writeln!(output, "  {}", rule);
    let _ = writeln!(output, "  Models tracked:  {}", overview.total_resources);
    let _ = writeln!(output, "  Available:       {}", overview.available_count);
    let _ = writeln!(output, "  Requests today:  {}", overview.total_requests);
    let _ = writeln!(
        output,
        "  Success rate:    {:.1}%",
        overview.success_rate * 100.0
    );
    let _ = writeln!(output, "  Next reset:      {}", local_time(overview.next_reset));
    let _ = writeln!(output, "  {}", rule);

    if ranked.is_empty() {
        let _ = writeln!(output, "  ⚠️  No available models!");
    } else {
        for (idx, model) in ranked.iter().take(AVAILABILITY_TOP_N).enumerate() {
            let requests = format!("{}/{}", model.successful_requests, model.requests);
            let _ = writeln!(
                output,
                "  {}. {:<width$} {:>6} ({:>7})",
                idx + 1,
                short_name(&model.id),
                format!("{:.1}%", model.success_rate * 100.0),
                requests,
                width = RESOURCE_NAME_WIDTH
            );
        }
    }
    output.push_str("  ");
    output.push_str(&rule);

    output
}

/// Last path segment of a resource id, cut to the report column width
fn short_name(id: &str) -> String {
    let name = id.rsplit('/').next().unwrap_or(id);
    name.chars().take(RESOURCE_NAME_WIDTH).collect()
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

// ============================================================================
// Display Helpers
// ============================================================================

/// Format a number with thousands separators (e.g. 14,400)
#[must_use]
pub fn format_number_with_commas(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a number with K/M suffix for compact display.
#[must_use]
pub fn format_compact_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Format a chrono::Duration as human-readable "Xh Ym Zs".
#[must_use]
pub fn format_duration(d: &chrono::Duration) -> String {
    let total_secs = d.num_seconds();
    if total_secs <= 0 {
        return "now".to_string();
    }
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m", hours, mins)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}
