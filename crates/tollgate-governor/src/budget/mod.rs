//! Budget Tracking - Monetary spend against a capped budget
//!
//! This module accounts for paid API usage: each request's token counts
//! are priced, converted into the budget currency and subtracted from a
//! budget that also expires on a fixed date.
//!
//! # Module Structure
//!
//! - `pricing`: Per-model unit prices and the default price table
//! - `ledger`: Persisted budget ledger and request history
//! - `tracker`: BudgetTracker implementation

mod ledger;
mod pricing;
mod tracker;


pub use ledger::{BudgetLedger, RequestEntry};
pub use pricing::{default_pricing, PriceLookup, PriceTable, UnitPrice, USD_TO_EUR};
pub use tracker::{BudgetConfig, BudgetSnapshot, BudgetTracker, BudgetUpdate, Usage};
