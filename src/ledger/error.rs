//! Error types for ledger mutations.

use thiserror::Error;

use crate::Amount;
use crate::model::Head;

/// Validation failure of a ledger operation.
///
/// Every variant is detected before any state is touched, so a failed call
/// leaves balances and history exactly as they were.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error(
        "invalid amount {0}: must be finite, greater than zero and at most {max}",
        max = Amount::MAX
    )]
    InvalidAmount(f64),

    #[error(
        "insufficient balance in head \"{head}\": available {available}, requested {requested}"
    )]
    InsufficientBalance {
        head: Head,
        available: Amount,
        requested: Amount,
    },

    #[error("cannot transfer from \"{0}\" to itself")]
    SameHead(Head),

    #[error("head \"{0}\" is protected and cannot be deleted")]
    ProtectedHead(Head),

    #[error("balance of head \"{0}\" or the grand total would exceed {max}", max = Amount::MAX)]
    BalanceOverflow(Head),
}

/// A head whose stored balance disagrees with the replay of its history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub head: Head,
    /// Balance held in the ledger state, zero when the head was deleted.
    pub stored: Amount,
    pub replayed: Amount,
}
