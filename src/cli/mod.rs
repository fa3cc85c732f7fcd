//! Operator shell for inspecting and driving a ledger from the terminal.

pub mod commands;
pub mod core;
pub mod output;
mod registry;
mod shell;

pub use self::core::{CliError, CliMode, CommandError};
pub use shell::run_cli;
