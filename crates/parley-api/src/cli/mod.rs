//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Minimal chat application: server and terminal client.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value_t = 2022, env = "PARLEY_PORT")]
        port: u16,

        /// Host address to bind.
        #[arg(long, default_value = "127.0.0.1", env = "PARLEY_HOST")]
        host: String,
    },

    /// Run the interactive terminal chat client.
    ///
    /// Falls back to a local demo simulation when the server is
    /// unreachable.
    Chat {
        /// Base URL of the Parley server.
        #[arg(long, default_value = "http://127.0.0.1:2022", env = "PARLEY_SERVER")]
        server: String,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}
