use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Amount;
use crate::model::{Head, NORMAL_HEAD};

/// Current balance of every head.
///
/// Serialized as a plain mapping of head name to number. Only the ledger
/// operations may change balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerState {
    balances: BTreeMap<Head, Amount>,
}

impl Default for LedgerState {
    fn default() -> Self {
        let mut state = LedgerState {
            balances: BTreeMap::new(),
        };
        state.ensure_normal();
        state
    }
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `head`, zero when the head is unknown.
    pub fn balance(&self, head: &str) -> Amount {
        self.balances.get(head).copied().unwrap_or_default()
    }

    pub fn contains(&self, head: &str) -> bool {
        self.balances.contains_key(head)
    }

    /// Head names in lexical order.
    pub fn heads(&self) -> impl Iterator<Item = &str> + '_ {
        self.balances.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Amount)> + '_ {
        self.balances
            .iter()
            .map(|(head, amount)| (head.as_str(), *amount))
    }

    /// Grand total over all current heads.
    pub fn total(&self) -> Amount {
        self.balances.values().copied().sum()
    }

    /// Re-insert "Normal" at zero if a loaded state lost it.
    pub(super) fn ensure_normal(&mut self) {
        self.balances.entry(NORMAL_HEAD.to_string()).or_default();
    }

    /// Look up a head, creating it at zero when unknown.
    pub(super) fn get_or_create_head(&mut self, head: &str) -> &mut Amount {
        self.balances.entry(head.to_string()).or_default()
    }

    pub(super) fn credit(&mut self, head: &str, amount: Amount) {
        *self.get_or_create_head(head) += amount;
    }

    pub(super) fn debit(&mut self, head: &str, amount: Amount) {
        *self.get_or_create_head(head) -= amount;
    }

    /// Drop a head from the mapping. "Normal" is never removed.
    pub(super) fn remove(&mut self, head: &str) -> Option<Amount> {
        if head == NORMAL_HEAD {
            return None;
        }
        self.balances.remove(head)
    }
}

impl FromIterator<(Head, Amount)> for LedgerState {
    fn from_iter<I: IntoIterator<Item = (Head, Amount)>>(iter: I) -> Self {
        let mut state = LedgerState {
            balances: iter.into_iter().collect(),
        };
        state.ensure_normal();
        state
    }
}
