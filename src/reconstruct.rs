//! Balance reconstruction.
//!
//! Replays the history in creation order to recover, for every entry, the
//! balance of its head and the grand total right before and right after it.
//! Replay never touches the ledger state and depends on nothing but its input,
//! so the same history always yields the same steps.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::Amount;
use crate::model::{Head, HistoryEntry, NORMAL_HEAD};

/// Direction of a before/after pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// A value before and after one history entry was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variation {
    pub before: Amount,
    pub after: Amount,
}

impl Variation {
    pub fn trend(&self) -> Trend {
        match self.after.cmp(&self.before) {
            Ordering::Greater => Trend::Up,
            Ordering::Less => Trend::Down,
            Ordering::Equal => Trend::Flat,
        }
    }

    pub fn change(&self) -> Amount {
        self.after - self.before
    }
}

/// One replayed entry with the variation of its head and of the grand total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayStep<'a> {
    pub entry: &'a HistoryEntry,
    pub head: Variation,
    pub total: Variation,
}

/// Running balances while walking the history.
#[derive(Debug, Clone)]
pub struct Replay {
    balances: BTreeMap<Head, Amount>,
    total: Amount,
}

impl Default for Replay {
    fn default() -> Self {
        Self::with_heads(std::iter::empty())
    }
}

impl Replay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with "Normal" and every given head at zero.
    pub fn with_heads<'h>(heads: impl IntoIterator<Item = &'h str>) -> Self {
        let mut balances: BTreeMap<Head, Amount> = heads
            .into_iter()
            .map(|head| (head.to_string(), Amount::ZERO))
            .collect();
        balances.entry(NORMAL_HEAD.to_string()).or_default();
        Self {
            balances,
            total: Amount::ZERO,
        }
    }

    /// Apply one entry and return the (head, total) variations it caused.
    pub fn step(&mut self, entry: &HistoryEntry) -> (Variation, Variation) {
        let balance = self.balances.entry(entry.head.clone()).or_default();
        let prev_head = *balance;
        let prev_total = self.total;

        *balance += entry.delta();
        self.total += entry.delta();

        (
            Variation {
                before: prev_head,
                after: *balance,
            },
            Variation {
                before: prev_total,
                after: self.total,
            },
        )
    }

    /// Walk `history` in order, keeping only steps for `target` when given.
    ///
    /// Every entry is replayed regardless of the filter so the grand total
    /// stays correct.
    pub fn run<'a>(
        &mut self,
        history: &'a [HistoryEntry],
        target: Option<&str>,
    ) -> Vec<ReplayStep<'a>> {
        let mut steps = Vec::new();
        for entry in history {
            let (head, total) = self.step(entry);
            if target.is_none_or(|target| target == entry.head) {
                steps.push(ReplayStep { entry, head, total });
            }
        }
        steps
    }

    pub fn balance(&self, head: &str) -> Amount {
        self.balances.get(head).copied().unwrap_or_default()
    }

    pub fn into_balances(self) -> BTreeMap<Head, Amount> {
        self.balances
    }
}

/// Replay the whole history, optionally keeping only the steps of one head.
pub fn reconstruct<'a>(history: &'a [HistoryEntry], target: Option<&str>) -> Vec<ReplayStep<'a>> {
    Replay::new().run(history, target)
}

/// Balance of every head ever seen, computed from history alone.
pub fn derive_balances(history: &[HistoryEntry]) -> BTreeMap<Head, Amount> {
    let mut replay = Replay::new();
    for entry in history {
        replay.step(entry);
    }
    replay.into_balances()
}

/// Everything needed to show a single head: its replayed balance and its steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadDetails<'a> {
    pub head: Head,
    pub balance: Amount,
    pub steps: Vec<ReplayStep<'a>>,
}

pub fn head_details<'a>(history: &'a [HistoryEntry], head: &str) -> HeadDetails<'a> {
    let mut replay = Replay::new();
    let steps = replay.run(history, Some(head));
    HeadDetails {
        head: head.to_string(),
        balance: replay.balance(head),
        steps,
    }
}
