//! Evoke CLI entry point.
//!
//! Binary name: `evoke`
//!
//! Parses CLI arguments, initializes tracing and the engine (store,
//! transport, poller), then hands off to the interactive chat loop or one
//! of the inspection commands.

mod chat;
mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use evoke_core::session::store::SessionStore;
use evoke_infra::store::JsonFileSessionStore;

use cli::{Cli, Commands};
use state::EngineHandle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,evoke=debug",
        _ => "trace",
    };
    evoke_observe::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need engine state
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "evoke", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = evoke_infra::config::data_dir();
    let config = evoke_infra::config::load_config(&data_dir).await;

    let result = match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let engine = EngineHandle::init(config, &data_dir).await;
            let outcome = chat::run_chat_loop(&engine).await;
            engine.shutdown().await;
            outcome
        }
        Commands::Sessions => {
            // Read-only inspection: go straight to the store, no engine.
            let store = JsonFileSessionStore::new(&data_dir);
            let registry = store.load().await?;
            chat::print_session_table(&registry);
            Ok(())
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    evoke_observe::shutdown_tracing();
    result
}
