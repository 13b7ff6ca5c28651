// tree.rs: Recursive directory listing with build-artifact filtering.
//
// The listing is a map from directory (relative to the project root, `.` for
// the root) to a map of file name → content or placeholder. Build outputs,
// dependency caches, VCS metadata and dot-directories are skipped.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glob::Pattern;

/// Directory → (file name → content or placeholder).
pub type DirectoryTree = BTreeMap<String, BTreeMap<String, String>>;

pub const CONTENT_NOT_LOADED: &str = "Content not loaded.";
pub const BINARY_PLACEHOLDER: &str = "Binary file - content not shown";

/// Directory names never descended into.
const SKIP_DIRS: &[&str] = &[
    "out", "dist", "build", "target", "node_modules", "venv", "__pycache__", "coverage",
    "test-results", "temp", "templates", "Thumbs.db",
];

/// File names skipped outright; entries starting with `*` are globs.
const SKIP_FILES: &[&str] = &[
    ".gitattributes",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    ".npmrc",
    ".yarnrc",
    "Pipfile.lock",
    "poetry.lock",
    ".DS_Store",
    "Thumbs.db",
    ".editorconfig",
    ".env",
    ".env.local",
    ".env.dev",
    "*.pyc",
    "*.pyo",
    "*.pyd",
    "*.log",
    "*.tmp",
    "*.temp",
    "*.swp",
    "*.swo",
    "*.vsix",
];

/// Extensions (without the dot) skipped outright.
const SKIP_EXTENSIONS: &[&str] = &[
    "pyc", "pyo", "pyd", "log", "tmp", "temp", "o", "obj", "exe", "dll", "so", "dylib", "vsix",
    "map",
];

/// Compiled skip rules.
#[derive(Debug, Clone)]
pub struct SkipRules {
    dirs: Vec<String>,
    names: Vec<String>,
    patterns: Vec<Pattern>,
    extensions: Vec<String>,
}

impl Default for SkipRules {
    fn default() -> Self {
        let (globs, names): (Vec<&str>, Vec<&str>) =
            SKIP_FILES.iter().copied().partition(|entry| entry.starts_with('*'));
        Self {
            dirs: SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
            names: names.into_iter().map(str::to_string).collect(),
            // The glob table is static and well-formed; a bad entry is dropped.
            patterns: globs.into_iter().filter_map(|g| Pattern::new(g).ok()).collect(),
            extensions: SKIP_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SkipRules {
    /// Dot-directories are always skipped.
    pub fn should_skip_dir(&self, name: &str) -> bool {
        name.starts_with('.') || self.dirs.iter().any(|d| d == name)
    }

    pub fn should_skip_file(&self, name: &str) -> bool {
        if self.names.iter().any(|n| n == name) {
            return true;
        }

        let extension = Path::new(name).extension().and_then(|e| e.to_str());
        if let Some(ext) = extension {
            if self.extensions.iter().any(|e| e == ext) {
                return true;
            }
        }

        self.patterns.iter().any(|p| p.matches(name))
    }
}

/// Walk `start` (which must be `root` or inside it) and build the listing.
pub fn read_tree(
    root: &Path,
    start: &Path,
    include_content: bool,
    rules: &SkipRules,
) -> DirectoryTree {
    let bound = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let mut tree = DirectoryTree::new();
    visit(root, &bound, start, include_content, rules, &mut tree);
    tree
}

/// True when `link` resolves to a path under `bound`. Dangling links and
/// links that leave the project are not listed.
pub(crate) fn link_stays_inside(link: &Path, bound: &Path) -> bool {
    fs::canonicalize(link).is_ok_and(|target| target.starts_with(bound))
}

fn visit(
    root: &Path,
    bound: &Path,
    dir: &Path,
    include_content: bool,
    rules: &SkipRules,
    tree: &mut DirectoryTree,
) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let files = tree.entry(relative_key(root, dir)).or_default();
    let mut subdirs = Vec::new();

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        let path = entry.path();
        let is_symlink = entry.file_type().is_ok_and(|t| t.is_symlink());

        if is_symlink && !link_stays_inside(&path, bound) {
            tracing::debug!(path = %path.display(), "skipping symlink that leaves the project");
            continue;
        }

        if path.is_dir() {
            // Symlinked directories are never descended into.
            if !is_symlink && !rules.should_skip_dir(&name) {
                subdirs.push(path);
            }
            continue;
        }

        if rules.should_skip_file(&name) {
            continue;
        }

        let value = if include_content {
            match fs::read(&path) {
                Ok(bytes) => {
                    String::from_utf8(bytes).unwrap_or_else(|_| BINARY_PLACEHOLDER.to_string())
                }
                Err(e) => format!("Error reading file: {}", e),
            }
        } else {
            CONTENT_NOT_LOADED.to_string()
        };
        files.insert(name, value);
    }

    subdirs.sort();
    for sub in subdirs {
        visit(root, bound, &sub, include_content, rules, tree);
    }
}

fn relative_key(root: &Path, dir: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => dir.display().to_string(),
    }
}
