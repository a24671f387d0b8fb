//! Ledger Cell - read-modify-write access to a stored ledger
//!
//! Each operation re-reads the document before mutating it, so short-lived
//! processes sharing one file mostly see each other's updates. There is no
//! file locking: two processes racing on the same file may lose an update.
//!
//! Recovery rules:
//! - missing or unreadable file: start from a fresh ledger
//! - failed write: keep the in-memory ledger and treat it as authoritative
//!   (skip re-reading) until a later write succeeds

use crate::error::Result;
use crate::store::JsonStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

#[derive(Debug)]
struct CellState<L> {
    ledger: Option<L>,
    dirty: bool,
}

/// A ledger owned by one tracker and persisted through a [`JsonStore`]
#[derive(Debug)]
pub struct LedgerCell<L> {
    kind: &'static str,
    store: JsonStore,
    state: Mutex<CellState<L>>,
}

impl<L> LedgerCell<L>
where
    L: Serialize + DeserializeOwned + Clone + PartialEq,
{
    /// Create a cell; `kind` names the ledger in log output
    #[must_use]
    pub fn new(kind: &'static str, store: JsonStore) -> Self {
        Self {
            kind,
            store,
            state: Mutex::new(CellState {
                ledger: None,
                dirty: false,
            }),
        }
    }

    /// Underlying store
    #[must_use]
    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    /// Whether the last write failed and memory is ahead of disk
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .dirty
    }

    /// Current ledger, re-read from the store unless the cell is dirty
    pub fn read(&self, fresh: impl FnOnce() -> L) -> L {
        self.update(fresh, |ledger| ledger.clone())
    }

    /// Load the current ledger, let `f` inspect or mutate it, and persist
    /// the result if it changed.
    ///
    /// `fresh` builds the ledger used when nothing usable is on disk.
    pub fn update<R>(&self, fresh: impl FnOnce() -> L, f: impl FnOnce(&mut L) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let mut ledger = self.current(&state, fresh);
        let before = ledger.clone();
        let out = f(&mut ledger);

        if ledger != before || state.dirty {
            self.persist(&mut state, &ledger);
        }
        state.ledger = Some(ledger);
        out
    }

    /// Overwrite the stored ledger.
    ///
    /// Unlike [`LedgerCell::update`], a write failure is returned; the new
    /// ledger still becomes the in-memory copy.
    pub fn replace(&self, ledger: L) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let result = self.store.save(&ledger);
        state.dirty = result.is_err();
        state.ledger = Some(ledger);
        result
    }

    fn current(&self, state: &CellState<L>, fresh: impl FnOnce() -> L) -> L {
        if state.dirty {
            if let Some(ledger) = &state.ledger {
                return ledger.clone();
            }
        }

        match self.store.load::<L>() {
            Ok(Some(ledger)) => ledger,
            Ok(None) => fresh(),
            Err(e) => {
                warn!(
                    kind = self.kind,
                    path = ?self.store.path(),
                    error = %e,
                    "Ledger unreadable, starting from a fresh ledger"
                );
                fresh()
            }
        }
    }

    fn persist(&self, state: &mut CellState<L>, ledger: &L) {
        match self.store.save(ledger) {
            Ok(()) => state.dirty = false,
            Err(e) => {
                warn!(
                    kind = self.kind,
                    path = ?self.store.path(),
                    error = %e,
                    "Failed to save ledger, keeping in-memory state"
                );
                state.dirty = true;
            }
        }
    }
}
