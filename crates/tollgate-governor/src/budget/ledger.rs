//! Budget Ledger
//!
//! Persisted spend, expiry and the bounded request history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One priced request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEntry {
    /// When the request was recorded
    pub timestamp: DateTime<Utc>,
    /// Model the request went to
    #[serde(alias = "model")]
    pub resource_id: String,
    /// Input tokens
    #[serde(default, alias = "inputTokens")]
    pub input_units: u64,
    /// Output tokens
    #[serde(default, alias = "outputTokens")]
    pub output_units: u64,
    /// Cost in the budget currency
    #[serde(default, alias = "costEUR")]
    pub cost: f64,
    /// Truncated caller note (e.g. prompt preview)
    #[serde(default, alias = "promptPreview")]
    pub note: String,
}

/// Persisted budget state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLedger {
    /// Budget cap
    pub total_budget: f64,
    /// Amount spent so far
    #[serde(default)]
    pub spent: f64,
    /// `total_budget - spent`, recomputed on every update
    #[serde(default)]
    pub remaining: f64,
    /// Budget currency code
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Budget expires at the start of this local date
    pub valid_until: NaiveDate,
    /// Requests recorded since the last reset
    #[serde(default)]
    pub request_count: u64,
    /// Most recent requests, oldest first
    #[serde(default, alias = "requests")]
    pub request_history: Vec<RequestEntry>,
    /// Date of the last save
    #[serde(default)]
    pub last_updated: Option<NaiveDate>,
}

pub(super) fn default_currency() -> String {
    "EUR".to_string()
}

impl BudgetLedger {
    /// Untouched budget
    #[must_use]
    pub fn new(total_budget: f64, currency: impl Into<String>, valid_until: NaiveDate) -> Self {
        Self {
            total_budget,
            spent: 0.0,
            remaining: total_budget,
            currency: currency.into(),
            valid_until,
            request_count: 0,
            request_history: Vec::new(),
            last_updated: None,
        }
    }

    /// Spent percentage of the budget (0.0 – 100.0+)
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total_budget <= 0.0 {
            return 100.0;
        }
        self.spent / self.total_budget * 100.0
    }

    /// Add `cost` to the spend and recompute `remaining`
    pub(super) fn charge(&mut self, cost: f64) {
        self.spent = round6(self.spent + cost);
        self.remaining = round6(self.total_budget - self.spent);
        self.request_count += 1;
    }

    /// Append an entry, evicting the oldest beyond `limit`
    pub(super) fn push_history(&mut self, entry: RequestEntry, limit: usize) {
        self.request_history.push(entry);
        if self.request_history.len() > limit {
            let excess = self.request_history.len() - limit;
            self.request_history.drain(0..excess);
        }
    }

    /// Zero the spend and drop the history
    pub(super) fn clear(&mut self) {
        self.spent = 0.0;
        self.remaining = self.total_budget;
        self.request_count = 0;
        self.request_history.clear();
    }
}

/// Round to 6 decimal places
pub(super) fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
