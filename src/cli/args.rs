//! CLI argument parsing with clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use super::enums::ToneArg;

/// Chat with a hosted model and watch an avatar speak the reply
#[derive(Parser, Debug)]
#[command(name = "avatar-chat")]
#[command(version, about = "Conversation bot with a speaking avatar", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a single message and wait for the reply (and its video)
    Ask {
        /// Your message
        message: String,

        #[command(flatten)]
        turn: TurnArgs,
    },
    /// Interactive session: one turn per line read from stdin
    Chat {
        #[command(flatten)]
        turn: TurnArgs,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options shared by every turn.
#[derive(ClapArgs, Debug, Clone)]
pub struct TurnArgs {
    /// System context for the model (e.g. "You are a helpful assistant.")
    #[arg(long, short, default_value = "")]
    pub system: String,

    /// Tone of the reply
    #[arg(long, short, default_value = "neutral")]
    pub tone: ToneArg,

    /// Skip avatar video generation
    #[arg(long)]
    pub no_video: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
