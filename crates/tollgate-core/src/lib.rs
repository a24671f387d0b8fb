//! Tollgate Core - Shared ledger infrastructure
//!
//! This crate provides the leaf components the trackers build on:
//! - Clock: "now" and local day boundaries, injectable for tests
//! - Store: one JSON document per ledger on stable storage
//! - Cell: read-modify-write access to a stored ledger with fallback
//!   to the in-memory copy when the disk misbehaves

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cell;
pub mod clock;
pub mod error;
pub mod store;

pub use cell::LedgerCell;
pub use clock::{
    local_date, local_midnight, next_local_midnight, start_of_local_day, Clock, ManualClock,
    SharedClock, SystemClock,
};
pub use error::{Error, Result};
pub use store::JsonStore;
