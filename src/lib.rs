pub mod amount;
pub mod csv;
pub mod ledger;
pub mod model;
pub mod reconstruct;
pub mod storage;
pub mod store;

pub use amount::Amount;
pub use ledger::{Ledger, LedgerError, LedgerState, Snapshot};
pub use model::{Command, EntryKind, Head, HistoryEntry, NORMAL_HEAD};
pub use reconstruct::{Trend, Variation, reconstruct};
pub use store::{LedgerStore, StoreError};
