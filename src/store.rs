//! A ledger bound to its storage.
//!
//! Every successful mutation is saved before the call returns, so memory and
//! storage can only diverge if the process dies between the two.

use thiserror::Error;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use crate::ledger::{Ledger, LedgerError};
use crate::model::{Command, Timestamp};
use crate::storage::{Storage, StorageError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("failed to persist ledger: {0}")]
    Storage(#[from] StorageError),
}

pub struct LedgerStore<S: Storage> {
    ledger: Ledger,
    storage: S,
}

impl<S: Storage> LedgerStore<S> {
    /// Load the saved state and build the ledger from it.
    pub fn open(mut storage: S) -> Result<Self, StoreError> {
        let snapshot = storage.load()?;
        Ok(Self {
            ledger: Ledger::init(snapshot),
            storage,
        })
    }

    pub fn with_clock(mut self, clock: fn() -> Timestamp) -> Self {
        self.ledger = self.ledger.with_clock(clock);
        self
    }

    /// Read-only view for balance and history queries.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.storage.save(&self.ledger.snapshot())?;
        Ok(())
    }

    pub fn add_money(&mut self, head: &str, amount: f64, note: &str) -> Result<(), StoreError> {
        self.ledger.add_money(head, amount, note)?;
        self.flush()
    }

    pub fn spend_money(&mut self, head: &str, amount: f64, note: &str) -> Result<(), StoreError> {
        self.ledger.spend_money(head, amount, note)?;
        self.flush()
    }

    pub fn transfer_money(&mut self, from: &str, to: &str, amount: f64) -> Result<(), StoreError> {
        self.ledger.transfer_money(from, to, amount)?;
        self.flush()
    }

    /// Delete a head. Asking the user for confirmation is the caller's job.
    pub fn delete_head(&mut self, head: &str) -> Result<(), StoreError> {
        self.ledger.delete_head(head)?;
        self.flush()
    }

    pub fn apply(&mut self, command: Command) -> Result<(), StoreError> {
        self.ledger.apply(command)?;
        self.flush()
    }

    /// Apply a stream of commands, saving after each accepted one.
    ///
    /// Rejected commands are skipped. A failed save is logged and the next
    /// successful one catches up.
    pub async fn run(&mut self, mut stream: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = stream.next().await {
            if let Err(StoreError::Storage(e)) = self.apply(command) {
                warn!(reason = %e, "ledger not persisted");
            }
        }
    }
}
