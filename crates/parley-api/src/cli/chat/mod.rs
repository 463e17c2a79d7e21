//! Interactive terminal chat client.
//!
//! On startup the client probes the server's health endpoint. Reachable:
//! every operation goes over the RPC surface. Unreachable: the whole
//! session downgrades to a local demo simulation behind the same
//! `ChatBackend` trait -- no per-call branching.

pub mod backend;
pub mod input;
pub mod loop_runner;

use console::style;

use parley_types::config::GlobalConfig;

use backend::{DemoBackend, RemoteBackend};

/// Run the chat client against the given server, falling back to demo mode
/// when the backend is unreachable.
pub async fn run_chat(server: &str) -> anyhow::Result<()> {
    if RemoteBackend::probe(server).await {
        loop_runner::run(RemoteBackend::new(server)).await
    } else {
        eprintln!(
            "  {} Backend connection failed. Using demo mode.",
            style("!").yellow().bold()
        );
        let limit = GlobalConfig::default().message_limit;
        loop_runner::run(DemoBackend::new(limit)).await
    }
}
