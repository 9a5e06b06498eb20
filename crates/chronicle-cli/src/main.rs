//! chronicle maintenance CLI entry point.
//!
//! Binary name: `chron`
//!
//! Parses CLI arguments, opens the file-backed history store, then
//! dispatches to the matching command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Shell completions don't need the store
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "chron", &mut std::io::stdout());
        return Ok(());
    }

    let mut state = AppState::open(cli.data_dir.clone())?;

    match cli.command {
        Commands::List => cli::session::list_sessions(&state, cli.json)?,
        Commands::Show { id } => cli::session::show_session(&state, &id, cli.json)?,
        Commands::New { title } => cli::session::new_session(&mut state, title, cli.json)?,
        Commands::Rename { id, title } => cli::session::rename_session(&mut state, &id, title)?,
        Commands::Switch { id } => cli::session::switch_session(&mut state, &id)?,
        Commands::Delete { id, yes } => cli::session::delete_session(&mut state, &id, yes)?,
        Commands::Stats => cli::storage::show_stats(&state, cli.json)?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
