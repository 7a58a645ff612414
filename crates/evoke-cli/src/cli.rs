//! Clap argument definitions for the `evoke` binary.

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

/// Real-time conversational assistant client.
#[derive(Parser)]
#[command(name = "evoke", version, about)]
pub struct Cli {
    /// Increase log verbosity (-v: info, -vv: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Export tracing spans via OpenTelemetry (stdout exporter)
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat (default when no command is given)
    Chat,

    /// List persisted chat sessions
    Sessions,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
