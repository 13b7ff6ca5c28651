// registry.rs: Tool name → handler table, built once at startup.
//
// Every project contributes the same tool set under its own prefix:
//   read_<p>_file        edit_<p>_file         create_<p>_path
//   delete_<p>_path      list_<p>_deletions    rename_<p>_path
//   list_<p>_renames     move_<p>_path         list_<p>_moves
//   read_<p>_directory   stage_<p>_file_edit
// and, with the staged-review extension:
//   list_<p>_staged_files  read_<p>_staged_file  edit_<p>_staged_file
//
// Handlers decode their JSON arguments into a typed params struct and never
// fail outright: engine errors come back as "Error: ..." output.

use std::collections::BTreeMap;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use pk_engine::{EditMode, EngineError, Extension, MutationEngine};
use pk_workspace::LockProbe;

use crate::config::GatewayConfig;
use crate::error::GatewayError;

// ── Tool parameter types ─────────────────────────────────────────

/// Parameters for tools that take a single path.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PathParams {
    /// Path relative to the project root.
    pub path: String,
}

/// Parameters for `edit_<p>_file`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EditParams {
    /// Path relative to the project root.
    pub path: String,
    /// New content, or the text to append.
    pub content: String,
    /// "replace" (default) or "append".
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "replace".to_string()
}

/// Parameters for `create_<p>_path`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateParams {
    /// Path relative to the project root.
    pub path: String,
    /// Create a folder instead of a file.
    #[serde(default)]
    pub is_folder: bool,
    /// Initial file content. Ignored for folders.
    #[serde(default)]
    pub content: String,
}

/// Parameters for `rename_<p>_path`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenameParams {
    /// Current path relative to the project root.
    pub old_path: String,
    /// New name, without any folder part.
    pub new_name: String,
}

/// Parameters for `move_<p>_path`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveParams {
    /// Path to move, relative to the project root.
    pub source_path: String,
    /// Destination path, relative to the project root. Must not exist.
    pub dest_path: String,
}

/// Parameters for `read_<p>_directory`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DirectoryParams {
    /// Folder to list, relative to the project root. Defaults to the root.
    #[serde(default = "default_dir")]
    pub path: String,
    /// Include file contents instead of a placeholder.
    #[serde(default)]
    pub include_content: bool,
}

fn default_dir() -> String {
    ".".to_string()
}

/// Parameters for `stage_<p>_file_edit`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct StageParams {
    /// Path relative to the project root.
    pub path: String,
    /// Full content to stage for review.
    pub content: String,
}

/// Parameters for `edit_<p>_staged_file`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct StagedEditParams {
    /// Staged file path, relative to the project root.
    pub path: String,
    /// Text to find. Every occurrence is replaced.
    pub find: String,
    pub replace: String,
}

/// Parameters for tools that take none.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct NoParams {}

// ── Registry ─────────────────────────────────────────────────────

/// What a tool returns to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Json(Value),
    /// A failure message, always starting with `Error: `.
    Error(String),
}

impl ToolOutput {
    fn from_result(result: Result<String, EngineError>) -> Self {
        match result {
            Ok(text) => ToolOutput::Text(text),
            Err(e) => ToolOutput::error(e),
        }
    }

    fn error(e: impl std::fmt::Display) -> Self {
        ToolOutput::Error(format!("Error: {}", e))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutput::Error(_))
    }

    /// The output as plain text; JSON is pretty-printed.
    pub fn text(&self) -> String {
        match self {
            ToolOutput::Text(t) | ToolOutput::Error(t) => t.clone(),
            ToolOutput::Json(v) => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
        }
    }
}

type Handler = Box<dyn Fn(Value) -> ToolOutput + Send + Sync>;

/// Name, description and input schema of a registered tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Map<String, Value>,
}

struct Registered {
    spec: ToolSpec,
    handler: Handler,
}

/// All tools the server offers.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Registered>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry for every project in `config`.
    ///
    /// A project whose root does not exist is skipped with a warning, so one
    /// missing checkout does not take the whole server down.
    pub fn build(config: &GatewayConfig) -> Result<Self, GatewayError> {
        config.validate()?;
        let mut registry = Self::new();

        for project in &config.projects {
            let root = config.resolve_root(project);
            if !root.is_dir() {
                tracing::warn!(
                    project = %project.label,
                    root = %root.display(),
                    "project root not found, skipping"
                );
                continue;
            }
            let engine = MutationEngine::new(project.profile(), &root, &config.base_dir)?;
            registry.register_project(Arc::new(engine))?;
        }

        tracing::info!(tools = registry.len(), "tool registry built");
        Ok(registry)
    }

    /// Register one typed tool.
    pub fn register<T, F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Result<(), GatewayError>
    where
        T: DeserializeOwned + JsonSchema + 'static,
        F: Fn(T) -> ToolOutput + Send + Sync + 'static,
    {
        let name = name.into();
        if self.tools.contains_key(&name) {
            return Err(GatewayError::DuplicateTool { name });
        }

        let tool_name = name.clone();
        let handler: Handler = Box::new(move |args: Value| {
            match serde_json::from_value::<T>(args) {
                Ok(params) => handler(params),
                Err(e) => ToolOutput::error(format!("invalid arguments for {}: {}", tool_name, e)),
            }
        });

        let spec = ToolSpec {
            name: name.clone(),
            description: description.into(),
            input_schema: input_schema::<T>(),
        };
        self.tools.insert(name, Registered { spec, handler });
        Ok(())
    }

    /// Register the standard tool set for `engine`, plus any extensions its
    /// profile enables.
    pub fn register_project<P>(
        &mut self,
        engine: Arc<MutationEngine<P>>,
    ) -> Result<(), GatewayError>
    where
        P: LockProbe + 'static,
    {
        let profile = engine.profile().clone();
        let p = profile.tool_prefix.as_str();
        let label = profile.label.as_str();

        let e = Arc::clone(&engine);
        self.register(
            format!("read_{}_file", p),
            format!("Read a text file from the {} project.", label),
            move |params: PathParams| ToolOutput::from_result(e.read(&params.path)),
        )?;

        let e = Arc::clone(&engine);
        let l = profile.label.clone();
        self.register(
            format!("edit_{}_file", p),
            format!(
                "Edit a file in the {} project (mode 'replace' or 'append'). If the file is \
                 open elsewhere, the edit is staged for manual review instead.",
                label
            ),
            move |params: EditParams| {
                ToolOutput::from_result(params.mode.parse::<EditMode>().and_then(|mode| {
                    e.edit(&params.path, &params.content, mode)
                        .map(|o| o.describe(&l))
                }))
            },
        )?;

        let e = Arc::clone(&engine);
        let l = profile.label.clone();
        self.register(
            format!("create_{}_path", p),
            format!("Create a file or folder in the {} project.", label),
            move |params: CreateParams| {
                ToolOutput::from_result(
                    e.create(&params.path, params.is_folder, &params.content)
                        .map(|c| c.describe(&l)),
                )
            },
        )?;

        let e = Arc::clone(&engine);
        let l = profile.label.clone();
        self.register(
            format!("delete_{}_path", p),
            format!(
                "Mark a file or folder in the {} project for deletion. Nothing is deleted; \
                 a log is written for a human to act on.",
                label
            ),
            move |params: PathParams| {
                ToolOutput::from_result(e.delete(&params.path).map(|m| m.describe(&l)))
            },
        )?;

        let e = Arc::clone(&engine);
        self.register(
            format!("list_{}_deletions", p),
            format!("List items marked for deletion in the {} project.", label),
            move |_: NoParams| ToolOutput::from_result(e.list_deletions()),
        )?;

        let e = Arc::clone(&engine);
        let l = profile.label.clone();
        self.register(
            format!("rename_{}_path", p),
            format!(
                "Request a rename in the {} project. Nothing is renamed; a log is written \
                 for a human to act on.",
                label
            ),
            move |params: RenameParams| {
                ToolOutput::from_result(
                    e.rename(&params.old_path, &params.new_name)
                        .map(|r| r.describe(&l)),
                )
            },
        )?;

        let e = Arc::clone(&engine);
        self.register(
            format!("list_{}_renames", p),
            format!("List renames awaiting action in the {} project.", label),
            move |_: NoParams| ToolOutput::from_result(e.list_renames()),
        )?;

        let e = Arc::clone(&engine);
        let l = profile.label.clone();
        self.register(
            format!("move_{}_path", p),
            format!(
                "Move a file or folder within the {} project. Fails if the destination \
                 exists. The move is logged.",
                label
            ),
            move |params: MoveParams| {
                ToolOutput::from_result(
                    e.move_path(&params.source_path, &params.dest_path)
                        .map(|m| m.describe(&l)),
                )
            },
        )?;

        let e = Arc::clone(&engine);
        self.register(
            format!("list_{}_moves", p),
            format!("Show recent moves in the {} project.", label),
            move |_: NoParams| ToolOutput::from_result(e.list_moves()),
        )?;

        let e = Arc::clone(&engine);
        self.register(
            format!("read_{}_directory", p),
            format!(
                "Recursively list a folder in the {} project, skipping build output and \
                 dependency folders.",
                label
            ),
            move |params: DirectoryParams| {
                let result = e
                    .read_directory(&params.path, params.include_content)
                    .map_err(|err| err.to_string())
                    .and_then(|tree| serde_json::to_value(tree).map_err(|err| err.to_string()));
                match result {
                    Ok(tree) => ToolOutput::Json(tree),
                    Err(err) => ToolOutput::Json(json!({ "error": format!("Error: {}", err) })),
                }
            },
        )?;

        let e = Arc::clone(&engine);
        let l = profile.label.clone();
        self.register(
            format!("stage_{}_file_edit", p),
            format!(
                "Stage new content for a file in the {} project for manual review, \
                 without touching the file.",
                label
            ),
            move |params: StageParams| {
                ToolOutput::from_result(
                    e.stage_edit(&params.path, &params.content)
                        .map(|s| s.describe(&l)),
                )
            },
        )?;

        if profile.has_extension(Extension::StagedReview) {
            self.register_staged_review(&engine)?;
        }

        tracing::debug!(project = %label, prefix = p, "project tools registered");
        Ok(())
    }

    fn register_staged_review<P>(
        &mut self,
        engine: &Arc<MutationEngine<P>>,
    ) -> Result<(), GatewayError>
    where
        P: LockProbe + 'static,
    {
        let profile = engine.profile().clone();
        let p = profile.tool_prefix.as_str();
        let label = profile.label.as_str();

        let e = Arc::clone(engine);
        let l = profile.label.clone();
        self.register(
            format!("list_{}_staged_files", p),
            format!("List files staged for review in the {} project.", label),
            move |_: NoParams| {
                ToolOutput::from_result(e.list_staged_files().map(|files| {
                    if files.is_empty() {
                        format!("No staged files in {} project.", l)
                    } else {
                        let mut out = format!("Staged files in {} project:\n", l);
                        for file in files {
                            out.push_str("- ");
                            out.push_str(&file);
                            out.push('\n');
                        }
                        out
                    }
                }))
            },
        )?;

        let e = Arc::clone(engine);
        self.register(
            format!("read_{}_staged_file", p),
            format!("Read a staged file from the {} project.", label),
            move |params: PathParams| ToolOutput::from_result(e.read_staged_file(&params.path)),
        )?;

        let e = Arc::clone(engine);
        let l = profile.label.clone();
        self.register(
            format!("edit_{}_staged_file", p),
            format!(
                "Find and replace text in a staged file of the {} project.",
                label
            ),
            move |params: StagedEditParams| {
                ToolOutput::from_result(
                    e.edit_staged_file(&params.path, &params.find, &params.replace)
                        .map(|s| s.describe(&l)),
                )
            },
        )
    }

    /// Run `name` with JSON `args`. `None` when no such tool exists.
    pub fn call(&self, name: &str, args: Value) -> Option<ToolOutput> {
        let tool = self.tools.get(name)?;
        tracing::debug!(tool = name, "tool call");
        let output = (tool.handler)(args);
        if output.is_error() {
            tracing::debug!(tool = name, output = %output.text(), "tool call failed");
        }
        Some(output)
    }

    /// Registered tools in name order.
    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.values().map(|t| &t.spec)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// JSON object schema for `T`.
fn input_schema<T: JsonSchema>() -> Map<String, Value> {
    match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(Value::Object(map)) => map,
        _ => {
            let mut map = Map::new();
            map.insert("type".to_string(), Value::String("object".to_string()));
            map
        }
    }
}
