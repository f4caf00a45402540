//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, enums, and subcommand handlers.

mod args;
mod commands;
mod enums;
mod presenter;

pub use args::{Args, Command};
pub use commands::{handle_config_action, run_ask, run_chat};
