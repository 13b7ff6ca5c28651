// error.rs: Error types for the MCP gateway.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading configuration or building the registry.
///
/// Tool calls themselves never fail with these; engine errors are rendered
/// into the tool output.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for a gateway config.
    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Two projects would share a staging/log namespace.
    #[error("staging subdir '{subdir}' is used by more than one project")]
    DuplicateSubdir { subdir: String },

    /// Two registrations produced the same tool name.
    #[error("tool '{name}' is registered more than once")]
    DuplicateTool { name: String },

    /// A project engine could not be created.
    #[error("engine error: {0}")]
    Engine(#[from] pk_engine::EngineError),
}
