//! Tollgate Governor - Usage accounting for rate-limited APIs
//!
//! Callers ask a tracker for permission before each external call and
//! report the outcome afterwards. Three accounting regimes are supported:
//! - Quota: fixed daily request count with one-shot threshold warnings
//! - Budget: monetary spend against a capped budget with an expiry date
//! - Availability: per-resource success/failure history over a pool of
//!   interchangeable free models, with a ranked "pick best" query
//!
//! Every tracker is constructed explicitly with its ledger path, config and
//! [`Clock`](tollgate_core::Clock); there is no process-global instance.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod availability;
pub mod budget;
pub mod governor;
pub mod quota;
pub mod report;

pub use availability::{
    Availability, AvailabilityConfig, AvailabilityLedger, AvailabilityOverview,
    AvailabilityTracker, LastError, ResourceOutcome, ResourceRecord, ResourceStats,
};
pub use budget::{
    default_pricing, BudgetConfig, BudgetLedger, BudgetSnapshot, BudgetTracker, BudgetUpdate,
    PriceTable, RequestEntry, UnitPrice, Usage,
};
pub use governor::{Decision, Governor, Notice, Severity};
pub use quota::{
    QuotaConfig, QuotaCounter, QuotaLedger, QuotaStats, WarningThresholds, WarningsFired,
};
pub use report::{
    format_availability, format_budget_status, format_compact_number, format_duration,
    format_number_with_commas, format_quota_stats,
};
