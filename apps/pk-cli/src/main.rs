//! # pk
//!
//! Command-line interface for Project Keeper.
//!
//! - `pk serve`: start the MCP server on stdio
//! - `pk pending deletions|renames|moves`: review logged operations
//! - `pk staged list|show`: inspect edits staged for manual review

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pk_gateway::GatewayConfig;

/// Project Keeper: safety-gated file tools for agents.
#[derive(Parser)]
#[command(name = "pk", version, about)]
struct Cli {
    /// Base directory holding keeper.toml, .staging/ and logs/.
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Config file (defaults to <base-dir>/keeper.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdio.
    Serve,
    /// Review deletions, renames and moves recorded in the audit logs.
    Pending {
        #[command(subcommand)]
        command: commands::pending::PendingCommands,
    },
    /// Inspect files staged for manual review.
    Staged {
        #[command(subcommand)]
        command: commands::staged::StagedCommands,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    let base_dir = cli.base_dir.canonicalize().unwrap_or(cli.base_dir);
    let config = GatewayConfig::load(&base_dir, cli.config.as_deref())?;

    match &cli.command {
        Commands::Serve => commands::serve::execute(&config),
        Commands::Pending { command } => commands::pending::execute(command, &config),
        Commands::Staged { command } => commands::staged::execute(command, &config),
    }
}

/// Logs go to stderr so they don't interfere with MCP on stdout.
fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("pk_engine=info".parse()?)
        .add_directive("pk_gateway=info".parse()?)
        .add_directive("pk=info".parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
