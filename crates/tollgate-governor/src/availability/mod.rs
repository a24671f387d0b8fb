//! Availability Tracking - Success/failure history over a model pool
//!
//! Free-tier models report no rate-limit headers, so their availability is
//! inferred locally from the outcome of each call. The whole ledger resets
//! at local midnight.
//!
//! # Module Structure
//!
//! - `ledger`: Per-resource records and the availability state
//! - `tracker`: AvailabilityTracker and the ranking query

mod ledger;
mod tracker;

#[cfg(test)]
mod tests;

pub use ledger::{Availability, AvailabilityLedger, LastError, ResourceRecord};
pub use tracker::{
    AvailabilityConfig, AvailabilityOverview, AvailabilityTracker, ResourceOutcome, ResourceStats,
};
