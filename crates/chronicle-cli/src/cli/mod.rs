//! CLI argument definitions and command handlers.

pub mod session;
pub mod storage;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Durable, bounded, multi-session chat history on disk.
#[derive(Parser)]
#[command(name = "chron", version, about)]
pub struct Cli {
    /// Emit machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Override the history data directory.
    #[arg(long, global = true, env = "CHRONICLE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all sessions.
    List,

    /// Show one session's transcript.
    Show {
        /// Session id (a unique prefix is enough).
        id: String,
    },

    /// Create a new empty session and make it active.
    New {
        /// Title for the session; without one, the first user message
        /// names it.
        title: Option<String>,
    },

    /// Rename a session.
    Rename {
        /// Session id (a unique prefix is enough).
        id: String,
        title: String,
    },

    /// Make a session the active one.
    Switch {
        /// Session id (a unique prefix is enough).
        id: String,
    },

    /// Delete a session and its transcript.
    Delete {
        /// Session id (a unique prefix is enough).
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Show storage usage against the configured budget.
    Stats,

    /// Generate shell completions.
    Completions { shell: Shell },
}
