// pending.rs: `pk pending` subcommands (deletions, renames, moves).
//
// Prints the same summaries the list_* tools return, for every configured
// project (or one, with --project).

use clap::Subcommand;

use pk_gateway::GatewayConfig;

#[derive(Subcommand)]
pub enum PendingCommands {
    /// Items marked for deletion.
    Deletions {
        /// Project label or tool prefix (defaults to all projects).
        #[arg(long)]
        project: Option<String>,
    },
    /// Renames awaiting manual action.
    Renames {
        #[arg(long)]
        project: Option<String>,
    },
    /// Recently completed moves.
    Moves {
        #[arg(long)]
        project: Option<String>,
    },
}

pub fn execute(cmd: &PendingCommands, config: &GatewayConfig) -> anyhow::Result<()> {
    let project = match cmd {
        PendingCommands::Deletions { project }
        | PendingCommands::Renames { project }
        | PendingCommands::Moves { project } => project.as_deref(),
    };

    for (i, engine) in super::engines(config, project)?.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let text = match cmd {
            PendingCommands::Deletions { .. } => engine.list_deletions()?,
            PendingCommands::Renames { .. } => engine.list_renames()?,
            PendingCommands::Moves { .. } => engine.list_moves()?,
        };
        println!("{}", text);
    }
    Ok(())
}
