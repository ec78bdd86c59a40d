use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quest_log::cli::{Cli, Command};
use quest_log::commands::{TerminalConfirmer, execute};
use quest_log::error::{QuestLogError, QuestLogResult};
use quest_log::storage::FileStore;
use quest_log::QuestLog;

fn run(cli: Cli) -> QuestLogResult<String> {
    cli.settings
        .validate()
        .map_err(QuestLogError::InvalidInput)?;
    if cli.settings.no_color {
        colored::control::set_override(false);
    }

    let root = match cli.settings.data_dir {
        Some(dir) => dir,
        None => FileStore::default_root()?,
    };
    tracing::debug!(root = %root.display(), key = %cli.settings.storage_key, "opening quest log");

    let mut app = QuestLog::open(FileStore::new(root), cli.settings.storage_key);
    let command = cli.command.unwrap_or(Command::List { all: false });
    execute(&mut app, command, &TerminalConfirmer)
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()) {
        Ok(output) => {
            print!("{output}");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}
