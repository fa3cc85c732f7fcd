use std::io;

use rustyline::error::ReadlineError;
use thiserror::Error;

use super::{
    commands, output,
    registry::{CommandEntry, CommandRegistry},
};
use crate::{
    config::{ConfigError, ConfigManager},
    errors::LedgerError,
    ledger::{LedgerOptions, TransactionLedger},
    storage::JsonFileStore,
};

pub const SCRIPT_ENV: &str = "CREDIT_LEDGER_CLI_SCRIPT";

/// Fatal shell errors; these end the session.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Per-command errors; reported and the shell keeps running.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("exit requested")]
    ExitRequested,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

/// State shared by every command handler during one shell session.
pub struct ShellContext {
    pub mode: CliMode,
    pub running: bool,
    pub(crate) ledger: TransactionLedger,
    registry: CommandRegistry,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let manager = ConfigManager::new()?;
        let config = manager.load()?;
        crate::init_with_filter(&config.log_filter);

        let store = JsonFileStore::new(manager.ledger_path(&config));
        let options =
            LedgerOptions::default().with_payment_method(config.default_payment_method.clone());
        let (ledger, report) = TransactionLedger::open_with(Box::new(store), options)?;
        for warning in &report.warnings {
            output::warning(warning);
        }

        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        Ok(Self {
            mode,
            running: true,
            ledger,
            registry,
        })
    }

    pub fn prompt(&self) -> String {
        format!(
            "credit[{}]> ",
            crate::currency::format_won(self.ledger.current_balance())
        )
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    pub(crate) fn commands(&self) -> Vec<&CommandEntry> {
        self.registry.list()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn dispatch(&mut self, command: &str, args: &[&str]) -> Result<LoopControl, CommandError> {
        match self.registry.handler(command) {
            Some(handler) => match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            },
            None => {
                output::warning(format!("Unknown command `{command}`."));
                output::hint("Type `help` to list commands.");
                Ok(LoopControl::Continue)
            }
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
            }
            CommandError::Ledger(err) if err.is_insufficient_balance() => {
                output::error(&err);
                output::hint("Add funds with `charge <amount>` and try again.");
            }
            CommandError::Ledger(err) => output::error(err),
        }
    }
}
