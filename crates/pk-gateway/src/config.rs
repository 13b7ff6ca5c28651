// config.rs: Gateway configuration.
//
// `<base>/keeper.toml` lists the managed projects:
//
//   [[project]]
//   label = "Web"
//   root = "../web"          # relative to the base directory
//   tool_prefix = "web"
//   staging_subdir = "web"
//   extensions = ["staged_review"]
//
// The base directory holds `.staging/` and `logs/` for every project. With
// no config file, `for_base()` manages the base directory itself.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use pk_engine::{Extension, ProjectProfile};

use crate::error::GatewayError;

/// Name of the config file looked up in the base directory.
pub const CONFIG_FILE: &str = "keeper.toml";

/// One managed project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub label: String,
    /// Project root; relative paths are resolved against the base directory.
    pub root: PathBuf,
    pub tool_prefix: String,
    pub staging_subdir: String,
    #[serde(default)]
    pub extensions: Vec<Extension>,
}

impl ProjectConfig {
    pub fn profile(&self) -> ProjectProfile {
        let mut profile = ProjectProfile::new(
            self.label.clone(),
            self.tool_prefix.clone(),
            self.staging_subdir.clone(),
        );
        for ext in &self.extensions {
            profile = profile.with_extension(*ext);
        }
        profile
    }
}

/// Configuration for the gateway server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Where `.staging/` and `logs/` live. Not read from the file.
    #[serde(skip)]
    pub base_dir: PathBuf,

    #[serde(rename = "project", default)]
    pub projects: Vec<ProjectConfig>,
}

impl GatewayConfig {
    /// A single project managing `base_dir` itself, with staged review on.
    pub fn for_base(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            projects: vec![ProjectConfig {
                label: "Keeper".to_string(),
                root: PathBuf::from("."),
                tool_prefix: "keeper".to_string(),
                staging_subdir: "keeper".to_string(),
                extensions: vec![Extension::StagedReview],
            }],
        }
    }

    /// Load `config_path`, or `<base_dir>/keeper.toml` when none is given.
    ///
    /// A missing default file falls back to [`GatewayConfig::for_base`]; a
    /// missing explicit file is an error.
    pub fn load(
        base_dir: impl AsRef<Path>,
        config_path: Option<&Path>,
    ) -> Result<Self, GatewayError> {
        let base_dir = base_dir.as_ref();
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = base_dir.join(CONFIG_FILE);
                if !default.exists() {
                    tracing::info!(base = %base_dir.display(), "no config file, managing base directory");
                    return Ok(Self::for_base(base_dir));
                }
                default
            }
        };

        let text = fs::read_to_string(&path).map_err(|source| GatewayError::ConfigRead {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml(base_dir, &text)
            .map_err(|source| GatewayError::ConfigParse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(base_dir: impl AsRef<Path>, text: &str) -> Result<Self, toml::de::Error> {
        let mut config: GatewayConfig = toml::from_str(text)?;
        config.base_dir = base_dir.as_ref().to_path_buf();
        Ok(config)
    }

    /// Staging subdirs must be unique so projects never share logs.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let mut seen = HashSet::new();
        for project in &self.projects {
            if !seen.insert(project.staging_subdir.as_str()) {
                return Err(GatewayError::DuplicateSubdir {
                    subdir: project.staging_subdir.clone(),
                });
            }
        }
        Ok(())
    }

    /// Absolute-or-base-relative root of `project`.
    pub fn resolve_root(&self, project: &ProjectConfig) -> PathBuf {
        if project.root.is_absolute() {
            project.root.clone()
        } else {
            self.base_dir.join(&project.root)
        }
    }
}
