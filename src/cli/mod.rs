//! CLI module for askbox.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::agent::AgentKind;
use clap::{Parser, Subcommand};

/// askbox - ask research, chat, and math agents from the terminal
///
/// Answers are shown in a running transcript, read aloud, and appended to a log.
#[derive(Parser, Debug)]
#[command(name = "askbox")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive session
    Chat {
        /// Agent selected at start (defaults to the configured agent)
        #[arg(short, long, value_enum)]
        agent: Option<AgentKind>,

        /// Do not read answers aloud
        #[arg(long)]
        no_speech: bool,
    },

    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,

        /// Agent to route the question to
        #[arg(short, long, value_enum)]
        agent: Option<AgentKind>,

        /// Do not read the answer aloud
        #[arg(long)]
        no_speech: bool,
    },

    /// Check configuration and external requirements
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}
