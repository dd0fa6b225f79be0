use std::env;
use std::io;
use std::process::ExitCode;

use headbook::csv::{read_commands, write_balances, write_history};
use headbook::storage::JsonFileStorage;
use headbook::store::LedgerStore;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: headbook <ledger.json> [commands.csv] [--history]";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut show_history = false;
    let mut positional = Vec::new();
    for arg in env::args().skip(1) {
        if arg == "--history" {
            show_history = true;
        } else {
            positional.push(arg);
        }
    }

    let (ledger_path, commands_path) = match positional.as_slice() {
        [ledger] => (ledger.clone(), None),
        [ledger, commands] => (ledger.clone(), Some(commands.clone())),
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let mut store = match LedgerStore::open(JsonFileStorage::new(&ledger_path)) {
        Ok(store) => store,
        Err(e) => {
            error!(path = %ledger_path, "{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = commands_path {
        if !path.ends_with(".csv") {
            warn!(path, "command file seems to not be a csv file");
        }

        let commands = match read_commands(path.clone()) {
            Ok(commands) => commands,
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        };

        let (command_sender, command_receiver) = tokio::sync::mpsc::channel(16);
        let reader = tokio::spawn(async move {
            for result in commands {
                match result {
                    Ok(command) => {
                        if command_sender.send(command).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("{e}");
                    }
                }
            }
        });

        store.run(ReceiverStream::new(command_receiver)).await;
        if let Err(e) = reader.await {
            error!("command reader failed: {e}");
            return ExitCode::FAILURE;
        }
    }

    let ledger = store.ledger();
    let written = if show_history {
        write_history(io::stdout().lock(), &ledger.replay(None))
    } else {
        write_balances(io::stdout().lock(), ledger.balances())
    };
    if let Err(e) = written {
        error!("failed to write output: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
