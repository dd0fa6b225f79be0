//! The ledger store.
//!
//! Holds the current balance of every head and the append-only history.
//! Four operations mutate it: add, spend, transfer and delete. Each one
//! validates its input first and then updates balances and history together,
//! so a failed call has no effect at all.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::Amount;
use crate::model::{Command, EntryKind, Head, HistoryEntry, NORMAL_HEAD, Timestamp, normalize_head};
use crate::reconstruct::{self, HeadDetails, Replay, ReplayStep, derive_balances};

mod state;
pub use state::LedgerState;

mod error;
pub use error::{LedgerError, Mismatch};

/// Owned pair of balances and history, as loaded from and saved to storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub heads: LedgerState,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Current time in epoch milliseconds.
pub fn system_clock() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as Timestamp)
        .unwrap_or_default()
}

/// Balances per head plus the full transaction history.
#[derive(Debug, Clone)]
pub struct Ledger {
    state: LedgerState,
    history: Vec<HistoryEntry>,
    clock: fn() -> Timestamp,
}

/// Public API
impl Ledger {
    pub fn new() -> Self {
        Self::init(Snapshot::default())
    }

    /// Build a ledger from previously saved state.
    ///
    /// "Normal" is restored if missing. Balances that disagree with the
    /// history are reported but kept as loaded.
    pub fn init(snapshot: Snapshot) -> Self {
        let Snapshot {
            heads: mut state,
            history,
        } = snapshot;
        state.ensure_normal();

        let ledger = Self {
            state,
            history,
            clock: system_clock,
        };

        if let Err(mismatches) = ledger.check_consistency() {
            for mismatch in mismatches {
                warn!(
                    head = %mismatch.head,
                    stored = %mismatch.stored,
                    replayed = %mismatch.replayed,
                    "loaded balance disagrees with history"
                );
            }
        }

        ledger
    }

    /// Replace the clock used to stamp new history entries.
    pub fn with_clock(mut self, clock: fn() -> Timestamp) -> Self {
        self.clock = clock;
        self
    }

    /// Copy of the state to hand to storage.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            heads: self.state.clone(),
            history: self.history.clone(),
        }
    }

    pub fn balances(&self) -> &LedgerState {
        &self.state
    }

    pub fn balance(&self, head: &str) -> Amount {
        self.state.balance(head)
    }

    pub fn heads(&self) -> impl Iterator<Item = &str> + '_ {
        self.state.heads()
    }

    pub fn total(&self) -> Amount {
        self.state.total()
    }

    /// History in creation order, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Credit `head` (created if unknown, empty means "Normal").
    pub fn add_money(&mut self, head: &str, amount: f64, note: &str) -> Result<(), LedgerError> {
        let amount = Self::validate_amount(amount)?;
        let head = normalize_head(head);
        self.ensure_room(&head, amount)?;
        self.state
            .total()
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow(head.clone()))?;
        let timestamp = self.now();

        self.state.credit(&head, amount);
        self.record(EntryKind::Add, head, amount, note.trim().to_string(), timestamp);

        Ok(())
    }

    /// Debit `head`. Never lets a head go below zero.
    pub fn spend_money(&mut self, head: &str, amount: f64, note: &str) -> Result<(), LedgerError> {
        let amount = Self::validate_amount(amount)?;
        let head = normalize_head(head);
        self.ensure_available(&head, amount)?;
        let timestamp = self.now();

        self.state.debit(&head, amount);
        self.record(EntryKind::Spend, head, amount, note.trim().to_string(), timestamp);

        Ok(())
    }

    /// Move `amount` from one head to another.
    ///
    /// Appends a spend on `from` followed by an add on `to`, both with the
    /// same timestamp.
    pub fn transfer_money(&mut self, from: &str, to: &str, amount: f64) -> Result<(), LedgerError> {
        let from = normalize_head(from);
        let to = normalize_head(to);
        if from == to {
            return Err(LedgerError::SameHead(from));
        }
        let amount = Self::validate_amount(amount)?;
        self.ensure_available(&from, amount)?;
        self.ensure_room(&to, amount)?;
        let timestamp = self.now();

        self.state.debit(&from, amount);
        self.state.credit(&to, amount);

        let spend_note = format!("Transferred to \"{to}\"");
        let add_note = format!("Received from \"{from}\"");
        self.record(EntryKind::Spend, from, amount, spend_note, timestamp);
        self.record(EntryKind::Add, to, amount, add_note, timestamp);

        Ok(())
    }

    /// Remove a head, first moving any residual balance to "Normal".
    ///
    /// The head's history stays in place. Deleting an unknown head succeeds
    /// without effect.
    pub fn delete_head(&mut self, head: &str) -> Result<(), LedgerError> {
        let head = normalize_head(head);
        if head == NORMAL_HEAD {
            return Err(LedgerError::ProtectedHead(head));
        }

        let residual = self.state.balance(&head);
        if !residual.is_zero() {
            let timestamp = self.now();
            let moved_in = format!("Balance moved from deleted head \"{head}\"");
            let moved_out = "Balance moved to \"Normal\" before deletion".to_string();

            if residual.is_positive() {
                self.ensure_room(NORMAL_HEAD, residual)?;
                self.state.credit(NORMAL_HEAD, residual);
                self.state.debit(&head, residual);
                self.record(EntryKind::Add, NORMAL_HEAD.to_string(), residual, moved_in, timestamp);
                self.record(EntryKind::Spend, head.clone(), residual, moved_out, timestamp);
            } else {
                // Only reachable from a loaded state that already went negative.
                let owed = residual.abs();
                warn!(head = %head, balance = %residual, "deleting head with negative balance");
                self.state.debit(NORMAL_HEAD, owed);
                self.state.credit(&head, owed);
                self.record(EntryKind::Spend, NORMAL_HEAD.to_string(), owed, moved_in, timestamp);
                self.record(EntryKind::Add, head.clone(), owed, moved_out, timestamp);
            }
        }

        self.state.remove(&head);

        Ok(())
    }

    /// Apply a single command on top of the current state.
    pub fn apply(&mut self, command: Command) -> Result<(), LedgerError> {
        match &command {
            Command::Add { head, amount, note } => {
                let result = self.add_money(head, *amount, note);
                Self::log_result("add", head, Some(*amount), &result);
                result
            }
            Command::Spend { head, amount, note } => {
                let result = self.spend_money(head, *amount, note);
                Self::log_result("spend", head, Some(*amount), &result);
                result
            }
            Command::Transfer { from, to, amount } => {
                let result = self.transfer_money(from, to, *amount);
                match &result {
                    Ok(()) => info!(from = %from, to = %to, amount = %amount, "transfer applied"),
                    Err(e) => info!(
                        from = %from,
                        to = %to,
                        amount = %amount,
                        reason = %e,
                        "transfer skipped"
                    ),
                }
                result
            }
            Command::DeleteHead { head } => {
                let result = self.delete_head(head);
                Self::log_result("delete", head, None, &result);
                result
            }
        }
    }

    /// Apply every command of the stream in order.
    pub async fn run(&mut self, mut stream: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = stream.next().await {
            // a rejected command must not stop the rest of the stream
            let _ = self.apply(command);
        }
    }

    /// Replay the history, keeping only the steps of `target` when given.
    pub fn replay(&self, target: Option<&str>) -> Vec<ReplayStep<'_>> {
        Replay::with_heads(self.state.heads()).run(&self.history, target)
    }

    /// Replayed balance and steps of one head, deleted heads included.
    pub fn head_details(&self, head: &str) -> HeadDetails<'_> {
        reconstruct::head_details(&self.history, head)
    }

    /// Compare each balance with the sum of its head's history.
    ///
    /// Heads that only survive in history must replay to zero.
    pub fn check_consistency(&self) -> Result<(), Vec<Mismatch>> {
        let replayed = derive_balances(&self.history);
        let mut mismatches = Vec::new();

        for (head, replayed_balance) in &replayed {
            let stored = self.state.balance(head);
            if stored != *replayed_balance {
                mismatches.push(Mismatch {
                    head: head.clone(),
                    stored,
                    replayed: *replayed_balance,
                });
            }
        }
        for (head, stored) in self.state.iter() {
            if !replayed.contains_key(head) && !stored.is_zero() {
                mismatches.push(Mismatch {
                    head: head.to_string(),
                    stored,
                    replayed: Amount::ZERO,
                });
            }
        }

        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(mismatches)
        }
    }
}

/// Private API
impl Ledger {
    fn log_result(op: &str, head: &str, amount: Option<f64>, result: &Result<(), LedgerError>) {
        match (result, amount) {
            (Ok(()), Some(amt)) => info!(head = %head, amount = %amt, "{op} applied"),
            (Ok(()), None) => info!(head = %head, "{op} applied"),
            (Err(e), Some(amt)) => info!(head = %head, amount = %amt, reason = %e, "{op} skipped"),
            (Err(e), None) => info!(head = %head, reason = %e, "{op} skipped"),
        }
    }

    /// Accept only finite amounts that stay strictly positive at ledger precision.
    fn validate_amount(amount: f64) -> Result<Amount, LedgerError> {
        Amount::try_from_float(amount)
            .filter(|parsed| parsed.is_positive())
            .ok_or(LedgerError::InvalidAmount(amount))
    }

    fn ensure_available(&self, head: &str, amount: Amount) -> Result<(), LedgerError> {
        let available = self.state.balance(head);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                head: head.to_string(),
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Fail when crediting `amount` would push `head` past [`Amount::MAX`].
    fn ensure_room(&self, head: &str, amount: Amount) -> Result<(), LedgerError> {
        match self.state.balance(head).checked_add(amount) {
            Some(_) => Ok(()),
            None => Err(LedgerError::BalanceOverflow(head.to_string())),
        }
    }

    /// Timestamp for a new entry, never earlier than the last recorded one.
    fn now(&self) -> Timestamp {
        let last = self.history.last().map_or(0, |entry| entry.timestamp);
        (self.clock)().max(last)
    }

    fn record(
        &mut self,
        kind: EntryKind,
        head: Head,
        amount: Amount,
        note: String,
        timestamp: Timestamp,
    ) {
        self.history.push(HistoryEntry {
            kind,
            head,
            amount,
            note,
            timestamp,
        });
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
