use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "conductor")]
#[command(about = "Simulated multi-agent conductor workflow")]
#[command(long_about = "Plays back the conductor demo: the conductor analyzes a request, dispatches \
                       it to three mock agents, merges their work and prints a canned plan. \
                       Nothing is routed or invoked; every step runs on a fixed timer.")]
pub struct Cli {
    /// Configuration file to load instead of ./conductor.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit JSON log lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a workflow cycle and print every change until it completes
    Run {
        /// Reset the workflow this many milliseconds after starting
        #[arg(long, value_name = "MS", help = "Cancel the cycle mid-run to demonstrate reset")]
        reset_after_ms: Option<u64>,
        /// Print each dashboard snapshot as a JSON line instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the configured timeline without running it
    Schedule,
}
