//! Core domain types for the ledger.

use serde::{Deserialize, Serialize};

use crate::Amount;

/// Name of a balance bucket.
pub type Head = String;

/// The default head. Always present, never deletable.
pub const NORMAL_HEAD: &str = "Normal";

/// Epoch milliseconds.
pub type Timestamp = u64;

/// Trim a user supplied head name; an empty name means [`NORMAL_HEAD`].
pub fn normalize_head(raw: &str) -> Head {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        NORMAL_HEAD.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Direction of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Increase of the named head.
    Add,
    /// Decrease of the named head.
    Spend,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Add => "add",
            EntryKind::Spend => "spend",
        }
    }
}

/// An immutable record appended for every balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub head: Head,
    /// Always strictly positive.
    pub amount: Amount,
    #[serde(default)]
    pub note: String,
    pub timestamp: Timestamp,
}

impl HistoryEntry {
    /// Signed effect of this entry on its head and on the grand total.
    pub fn delta(&self) -> Amount {
        match self.kind {
            EntryKind::Add => self.amount,
            EntryKind::Spend => -self.amount,
        }
    }
}

/// A request to mutate the ledger, as issued by a caller or read from a file.
///
/// Amounts are raw user input and get validated when applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Credit a head, creating it if unknown.
    Add {
        head: Head,
        amount: f64,
        note: String,
    },
    /// Debit a head; never overdraws.
    Spend {
        head: Head,
        amount: f64,
        note: String,
    },
    /// Move funds between two distinct heads.
    Transfer { from: Head, to: Head, amount: f64 },
    /// Remove a head, moving any residual balance to [`NORMAL_HEAD`].
    DeleteHead { head: Head },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_defaults() {
        assert_eq!(normalize_head("  Food "), "Food");
        assert_eq!(normalize_head(""), NORMAL_HEAD);
        assert_eq!(normalize_head("   "), NORMAL_HEAD);
    }

    #[test]
    fn delta_is_signed_by_kind() {
        let mut entry = HistoryEntry {
            kind: EntryKind::Add,
            head: "Food".into(),
            amount: Amount::from_scaled(500),
            note: String::new(),
            timestamp: 1,
        };
        assert_eq!(entry.delta(), Amount::from_scaled(500));
        entry.kind = EntryKind::Spend;
        assert_eq!(entry.delta(), Amount::from_scaled(-500));
    }

    #[test]
    fn entry_uses_persisted_field_names() {
        let entry = HistoryEntry {
            kind: EntryKind::Spend,
            head: "Food".into(),
            amount: Amount::from_float(12.5),
            note: "lunch".into(),
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"type":"spend","head":"Food","amount":12.5,"#,
                r#""note":"lunch","timestamp":1700000000000}"#,
            )
        );
        let back: HistoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn missing_note_defaults_to_empty() {
        let entry: HistoryEntry =
            serde_json::from_str(r#"{"type":"add","head":"Normal","amount":1,"timestamp":5}"#)
                .unwrap();
        assert_eq!(entry.note, "");
        assert_eq!(entry.kind, EntryKind::Add);
    }
}
