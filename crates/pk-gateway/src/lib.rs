//! # pk-gateway
//!
//! Exposes one or more [`MutationEngine`](pk_engine::MutationEngine)s as MCP
//! tools. Projects come from a [`GatewayConfig`]; each contributes a fixed set
//! of tools named after its prefix (`read_<prefix>_file`, ...), collected into
//! a [`ToolRegistry`] once at startup. [`KeeperServer`] answers `tools/list`
//! and `tools/call` from that registry.

pub mod config;
pub mod error;
pub mod registry;
pub mod server;

pub use config::{GatewayConfig, ProjectConfig};
pub use error::GatewayError;
pub use registry::{ToolOutput, ToolRegistry, ToolSpec};
pub use server::KeeperServer;
