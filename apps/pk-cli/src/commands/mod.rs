pub mod pending;
pub mod serve;
pub mod staged;

use pk_engine::MutationEngine;
use pk_gateway::GatewayConfig;

/// Engines for the configured projects, optionally narrowed to one project
/// by label or tool prefix. Projects whose root is missing are skipped.
pub fn engines(
    config: &GatewayConfig,
    project: Option<&str>,
) -> anyhow::Result<Vec<MutationEngine>> {
    let mut engines = Vec::new();
    for entry in &config.projects {
        if let Some(wanted) = project {
            if !entry.label.eq_ignore_ascii_case(wanted) && entry.tool_prefix != wanted {
                continue;
            }
        }
        let root = config.resolve_root(entry);
        if !root.is_dir() {
            tracing::warn!(project = %entry.label, root = %root.display(), "project root not found, skipping");
            continue;
        }
        engines.push(MutationEngine::new(entry.profile(), &root, &config.base_dir)?);
    }

    if engines.is_empty() {
        match project {
            Some(name) => anyhow::bail!("no project named '{}' is configured", name),
            None => anyhow::bail!("no configured project has an existing root"),
        }
    }
    Ok(engines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn config(base: &std::path::Path) -> GatewayConfig {
        fs::create_dir_all(base.join("web")).unwrap();
        fs::create_dir_all(base.join("api")).unwrap();
        GatewayConfig::from_toml(
            base,
            "[[project]]\nlabel = \"Web\"\nroot = \"web\"\ntool_prefix = \"web\"\nstaging_subdir = \"web\"\n\
             [[project]]\nlabel = \"Api\"\nroot = \"api\"\ntool_prefix = \"api\"\nstaging_subdir = \"api\"\n",
        )
        .unwrap()
    }

    #[test]
    fn selects_by_label_or_prefix() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());

        assert_eq!(engines(&config, None).unwrap().len(), 2);
        let web = engines(&config, Some("WEB")).unwrap();
        assert_eq!(web.len(), 1);
        assert_eq!(web[0].profile().label, "Web");
        assert_eq!(engines(&config, Some("api")).unwrap()[0].profile().label, "Api");
    }

    #[test]
    fn unknown_project_is_an_error() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        assert!(engines(&config, Some("mobile")).is_err());
    }
}
