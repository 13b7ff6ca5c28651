// staged.rs: `pk staged` subcommands (list, show).

use clap::Subcommand;

use pk_gateway::GatewayConfig;

#[derive(Subcommand)]
pub enum StagedCommands {
    /// List staged files per project.
    List {
        /// Project label or tool prefix (defaults to all projects).
        #[arg(long)]
        project: Option<String>,
    },
    /// Print one staged file.
    Show {
        /// Path relative to the project root.
        path: String,
        /// Project label or tool prefix. Required when several are configured.
        #[arg(long)]
        project: Option<String>,
    },
}

pub fn execute(cmd: &StagedCommands, config: &GatewayConfig) -> anyhow::Result<()> {
    match cmd {
        StagedCommands::List { project } => {
            for engine in super::engines(config, project.as_deref())? {
                let label = &engine.profile().label;
                let files = engine.list_staged_files()?;
                if files.is_empty() {
                    println!("No staged files in {} project.", label);
                    continue;
                }
                println!(
                    "Staged files in {} project ({}):",
                    label,
                    engine.staging().staging_path().display()
                );
                for file in files {
                    println!("  {}", file);
                }
            }
        }

        StagedCommands::Show { path, project } => {
            let engines = super::engines(config, project.as_deref())?;
            if engines.len() > 1 {
                anyhow::bail!("several projects are configured; pass --project");
            }
            for engine in engines {
                print!("{}", engine.read_staged_file(path)?);
            }
        }
    }
    Ok(())
}
