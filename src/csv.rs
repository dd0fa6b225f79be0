use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::ledger::LedgerState;
use crate::model::{Command, Timestamp};
use crate::reconstruct::ReplayStep;

/// Errors that can occur when reading command rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("cannot open command file: {0}")]
    Open(csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized command type '{command}'")]
    UnrecognizedType { line: usize, command: String },

    #[error("line {line}: {command} missing amount")]
    MissingAmount { line: usize, command: String },

    #[error("line {line}: transfer missing destination head")]
    MissingDestination { line: usize },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    r#type: String,
    #[serde(default)]
    head: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    head: &'a str,
    balance: String,
}

#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    timestamp: Timestamp,
    r#type: &'static str,
    head: &'a str,
    amount: String,
    note: &'a str,
    head_before: String,
    head_after: String,
    total_before: String,
    total_after: String,
}

/// Read commands from a csv file with header `type,head,to,amount,note`
pub fn read_commands(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Command, CsvError>>, CsvError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(CsvError::Open)?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            parse_row(line, row)
        }))
}

fn parse_row(line: usize, row: InputRow) -> Result<Command, CsvError> {
    let command = row.r#type.to_lowercase();
    let head = row.head.unwrap_or_default();
    let note = row.note.unwrap_or_default();
    let amount = || {
        row.amount.ok_or_else(|| CsvError::MissingAmount {
            line,
            command: command.clone(),
        })
    };

    match command.as_str() {
        "add" => Ok(Command::Add {
            amount: amount()?,
            head,
            note,
        }),
        "spend" => Ok(Command::Spend {
            amount: amount()?,
            head,
            note,
        }),
        "transfer" => {
            let amount = amount()?;
            let to = row
                .to
                .filter(|to| !to.is_empty())
                .ok_or(CsvError::MissingDestination { line })?;
            Ok(Command::Transfer {
                from: head,
                to,
                amount,
            })
        }
        "delete" => Ok(Command::DeleteHead { head }),
        other => Err(CsvError::UnrecognizedType {
            line,
            command: other.to_string(),
        }),
    }
}

/// Write current balances in csv format
pub fn write_balances(writer: impl io::Write, balances: &LedgerState) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    for (head, balance) in balances.iter() {
        writer.serialize(BalanceRow {
            head,
            balance: balance.to_string(),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Write replayed history, one row per step, in csv format
pub fn write_history(writer: impl io::Write, steps: &[ReplayStep<'_>]) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    for step in steps {
        let entry = step.entry;
        writer.serialize(HistoryRow {
            timestamp: entry.timestamp,
            r#type: entry.kind.as_str(),
            head: &entry.head,
            amount: entry.amount.to_string(),
            note: &entry.note,
            head_before: step.head.before.to_string(),
            head_after: step.head.after.to_string(),
            total_before: step.total.before.to_string(),
            total_after: step.total.after.to_string(),
        })?;
    }

    writer.flush()?;
    Ok(())
}
