// safety_policy.rs: End-to-end checks of the mutation safety policy.
//
// Each test drives a MutationEngine against a temp project and verifies the
// on-disk result, not just the returned message:
//
//   - paths that escape the root are rejected
//   - create → read returns the exact content
//   - append composes "A\n<content>" directly and when staged
//   - a locked file is never touched; the edit lands in .staging/<subdir>/,
//     also when the lock only shows up during the write
//   - delete and rename only write logs; the tree is unchanged
//   - move refuses to overwrite, and otherwise moves and logs exactly once
//   - deleting a directory records its recursive size

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tempfile::{tempdir, TempDir};

use pk_engine::{EditMode, EngineError, MutationEngine, ProjectProfile};
use pk_workspace::LockProbe;

/// Reports the `locked` file names as locked. Names in `write_errors` pass
/// the lock check but fail when opened for writing, as if another program
/// grabbed them in between.
struct StubProbe {
    locked: HashSet<String>,
    write_errors: HashMap<String, io::ErrorKind>,
}

impl StubProbe {
    fn locking(names: &[&str]) -> Self {
        Self {
            locked: names.iter().map(|n| n.to_string()).collect(),
            write_errors: HashMap::new(),
        }
    }

    fn failing_writes(names: &[(&str, io::ErrorKind)]) -> Self {
        Self {
            locked: HashSet::new(),
            write_errors: names
                .iter()
                .map(|(n, kind)| (n.to_string(), *kind))
                .collect(),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl LockProbe for StubProbe {
    fn is_editable(&self, path: &Path) -> bool {
        !self.locked.contains(&file_name(path))
    }

    fn open_for_write(&self, path: &Path, append: bool) -> io::Result<File> {
        if let Some(kind) = self.write_errors.get(&file_name(path)) {
            return Err(io::Error::new(*kind, "simulated write failure"));
        }
        OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
    }
}

struct Fixture {
    _dir: TempDir,
    base: PathBuf,
    engine: MutationEngine<StubProbe>,
}

impl Fixture {
    fn new(locked: &[&str]) -> Self {
        Self::with_probe(StubProbe::locking(locked))
    }

    fn with_probe(probe: StubProbe) -> Self {
        let dir = tempdir().unwrap();
        let base = dir.path().to_path_buf();
        fs::create_dir_all(base.join("project")).unwrap();
        let engine = MutationEngine::with_probe(
            ProjectProfile::new("Web", "web", "web"),
            base.join("project"),
            &base,
            probe,
        )
        .unwrap();
        Self {
            _dir: dir,
            base,
            engine,
        }
    }

    fn root(&self) -> &Path {
        self.engine.root()
    }

    fn log_count(&self, kind_dir: &str) -> usize {
        let dir = self.base.join("logs/web").join(kind_dir);
        if !dir.exists() {
            return 0;
        }
        fs::read_dir(dir).unwrap().count()
    }
}

#[test]
fn escaping_paths_are_rejected_everywhere() {
    let fx = Fixture::new(&[]);
    fs::write(fx.root().join("a.txt"), "a").unwrap();
    let outside = fx.base.join("outside.txt");
    fs::write(&outside, "secret").unwrap();

    for path in ["../outside.txt", "sub/../../outside.txt", "../../etc/passwd"] {
        assert!(matches!(fx.engine.read(path), Err(EngineError::InvalidPath { .. })));
        assert!(matches!(
            fx.engine.edit(path, "x", EditMode::Replace),
            Err(EngineError::InvalidPath { .. })
        ));
        assert!(matches!(
            fx.engine.create(path, false, "x"),
            Err(EngineError::InvalidPath { .. })
        ));
        assert!(matches!(fx.engine.delete(path), Err(EngineError::InvalidPath { .. })));
        assert!(matches!(
            fx.engine.move_path("a.txt", path),
            Err(EngineError::InvalidPath { .. })
        ));
    }

    assert_eq!(fs::read_to_string(&outside).unwrap(), "secret");
    assert!(fx.root().join("a.txt").exists());
    assert_eq!(fx.log_count("deletion"), 0);
}

#[test]
fn create_then_read_round_trips() {
    let fx = Fixture::new(&[]);

    for (path, content) in [
        ("top.txt", "hello"),
        ("deep/nested/dir/file.md", "# Title\n\nbody\n"),
        ("empty.txt", ""),
        ("unicode.txt", "héllo wörld ✓"),
    ] {
        let created = fx.engine.create(path, false, content).unwrap();
        assert!(!created.is_folder);
        assert_eq!(fx.engine.read(path).unwrap(), content);
    }
}

#[test]
fn direct_append_composes_with_newline() {
    let fx = Fixture::new(&[]);
    fx.engine.create("log.txt", false, "A").unwrap();

    let outcome = fx.engine.edit("log.txt", "B", EditMode::Append).unwrap();

    assert!(!outcome.is_staged());
    assert_eq!(fx.engine.read("log.txt").unwrap(), "A\nB");
    assert_eq!(
        outcome.describe("Web"),
        "Web file 'log.txt' successfully updated with mode 'append'."
    );
}

#[test]
fn staged_append_composes_the_same_value() {
    let fx = Fixture::new(&["locked.txt"]);
    fs::write(fx.root().join("locked.txt"), "A").unwrap();

    let outcome = fx.engine.edit("locked.txt", "B", EditMode::Append).unwrap();

    assert!(outcome.is_staged());
    assert_eq!(fs::read_to_string(fx.root().join("locked.txt")).unwrap(), "A");
    assert_eq!(
        fs::read_to_string(fx.base.join(".staging/web/locked.txt")).unwrap(),
        "A\nB"
    );
}

#[test]
fn locked_replace_is_staged_and_live_file_untouched() {
    let fx = Fixture::new(&["locked.txt"]);
    fs::write(fx.root().join("locked.txt"), "original").unwrap();

    let outcome = fx
        .engine
        .edit("locked.txt", "new body", EditMode::Replace)
        .unwrap();

    assert!(outcome.is_staged());
    assert_eq!(
        fs::read_to_string(fx.root().join("locked.txt")).unwrap(),
        "original"
    );
    assert_eq!(
        fs::read_to_string(fx.base.join(".staging/web/locked.txt")).unwrap(),
        "new body"
    );
    let message = outcome.describe("Web");
    assert!(message.contains(".staging/web/locked.txt"));
    assert!(message.contains("open/locked"));
}

#[test]
fn lock_error_during_write_falls_back_to_staging() {
    let fx = Fixture::with_probe(StubProbe::failing_writes(&[
        ("busy.txt", io::ErrorKind::PermissionDenied),
        ("log.txt", io::ErrorKind::PermissionDenied),
    ]));
    fs::write(fx.root().join("busy.txt"), "original").unwrap();
    fs::write(fx.root().join("log.txt"), "A").unwrap();

    let replaced = fx.engine.edit("busy.txt", "new body", EditMode::Replace).unwrap();
    let appended = fx.engine.edit("log.txt", "B", EditMode::Append).unwrap();

    assert!(replaced.is_staged());
    assert!(appended.is_staged());
    assert_eq!(fs::read_to_string(fx.root().join("busy.txt")).unwrap(), "original");
    assert_eq!(fs::read_to_string(fx.root().join("log.txt")).unwrap(), "A");
    assert_eq!(
        fs::read_to_string(fx.base.join(".staging/web/busy.txt")).unwrap(),
        "new body"
    );
    assert_eq!(
        fs::read_to_string(fx.base.join(".staging/web/log.txt")).unwrap(),
        "A\nB"
    );
}

#[test]
fn other_write_errors_are_reported_not_staged() {
    let fx = Fixture::with_probe(StubProbe::failing_writes(&[(
        "full.txt",
        io::ErrorKind::Other,
    )]));
    fs::write(fx.root().join("full.txt"), "original").unwrap();

    let result = fx.engine.edit("full.txt", "new body", EditMode::Replace);

    assert!(matches!(result, Err(EngineError::Io { .. })));
    assert_eq!(fs::read_to_string(fx.root().join("full.txt")).unwrap(), "original");
    assert!(!fx.base.join(".staging/web/full.txt").exists());
}

#[test]
fn append_to_empty_file_matches_between_direct_and_staged() {
    let fx = Fixture::new(&["locked.txt"]);
    fs::write(fx.root().join("open.txt"), "").unwrap();
    fs::write(fx.root().join("locked.txt"), "").unwrap();

    fx.engine.edit("open.txt", "B", EditMode::Append).unwrap();
    fx.engine.edit("locked.txt", "B", EditMode::Append).unwrap();

    assert_eq!(fx.engine.read("open.txt").unwrap(), "B");
    assert_eq!(
        fs::read_to_string(fx.base.join(".staging/web/locked.txt")).unwrap(),
        "B"
    );
}

#[test]
fn replace_overwrites_directly() {
    let fx = Fixture::new(&[]);
    fx.engine.create("a.txt", false, "one").unwrap();

    fx.engine.edit("a.txt", "two", EditMode::Replace).unwrap();

    assert_eq!(fx.engine.read("a.txt").unwrap(), "two");
    assert!(!fx.base.join(".staging").exists());
}

#[test]
fn delete_only_writes_a_log() {
    let fx = Fixture::new(&[]);
    fx.engine.create("doomed.txt", false, "still here").unwrap();

    let marked = fx.engine.delete("doomed.txt").unwrap();

    assert_eq!(fx.engine.read("doomed.txt").unwrap(), "still here");
    assert_eq!(fx.log_count("deletion"), 1);
    assert!(marked.log.path.exists());
    assert!(marked
        .describe("Web")
        .starts_with("Web file 'doomed.txt' marked for deletion."));

    let body = fs::read_to_string(&marked.log.path).unwrap();
    assert!(body.contains("\"confirmed\": false"));
    assert!(body.contains("\"content_sha256\""));

    let listing = fx.engine.list_deletions().unwrap();
    assert!(listing.contains("1. doomed.txt (file)"));
}

#[test]
fn delete_missing_path_is_not_found() {
    let fx = Fixture::new(&[]);
    assert!(matches!(
        fx.engine.delete("ghost.txt"),
        Err(EngineError::NotFound { .. })
    ));
    assert_eq!(fx.log_count("deletion"), 0);
}

#[test]
fn directory_deletion_records_recursive_size() {
    let fx = Fixture::new(&[]);
    fx.engine.create("data/ten.bin", false, &"x".repeat(10)).unwrap();
    fx.engine.create("data/sub/twenty.bin", false, &"x".repeat(20)).unwrap();
    fx.engine
        .create("data/sub/deeper/thirty.bin", false, &"x".repeat(30))
        .unwrap();

    let marked = fx.engine.delete("data").unwrap();

    let body = fs::read_to_string(&marked.log.path).unwrap();
    assert!(body.contains("\"total_size_bytes\": 60"));
    assert!(body.contains("\"file_count\": 3"));
    assert!(body.contains("- **File count**: 3 files"));
    assert!(fx.root().join("data/sub/deeper/thirty.bin").exists());
}

#[test]
fn rename_onto_existing_path_flags_conflict_and_changes_nothing() {
    let fx = Fixture::new(&[]);
    fx.engine.create("old.txt", false, "old").unwrap();
    fx.engine.create("new.txt", false, "new").unwrap();

    let staged = fx.engine.rename("old.txt", "new.txt").unwrap();

    assert!(staged.conflict);
    assert_eq!(fx.engine.read("old.txt").unwrap(), "old");
    assert_eq!(fx.engine.read("new.txt").unwrap(), "new");
    assert_eq!(fx.log_count("rename"), 1);

    let body = fs::read_to_string(&staged.log.path).unwrap();
    assert!(body.contains("\"conflict\": true"));
    assert!(staged.describe("Web").contains("WARNING: Destination already exists!"));
    assert!(fx.engine.list_renames().unwrap().contains("WARNING"));
}

#[test]
fn move_onto_existing_destination_is_a_conflict() {
    let fx = Fixture::new(&[]);
    fx.engine.create("src.txt", false, "source").unwrap();
    fx.engine.create("dst.txt", false, "dest").unwrap();

    let result = fx.engine.move_path("src.txt", "dst.txt");

    assert!(matches!(result, Err(EngineError::Conflict { .. })));
    assert_eq!(fx.engine.read("src.txt").unwrap(), "source");
    assert_eq!(fx.engine.read("dst.txt").unwrap(), "dest");
    assert_eq!(fx.log_count("move_completed"), 0);
}

#[test]
fn move_executes_and_logs_once() {
    let fx = Fixture::new(&[]);
    fx.engine.create("a/report.txt", false, "quarterly").unwrap();

    let moved = fx.engine.move_path("a/report.txt", "b/c/report.txt").unwrap();

    assert!(!fx.root().join("a/report.txt").exists());
    assert_eq!(fx.engine.read("b/c/report.txt").unwrap(), "quarterly");
    assert_eq!(fx.log_count("move_completed"), 1);
    assert!(moved.describe("Web").starts_with("SUCCESS: Web file successfully moved:"));

    let listing = fx.engine.list_moves().unwrap();
    assert!(listing.contains("a/report.txt -> b/c/report.txt"));
}

#[test]
fn move_with_long_names_is_logged_once() {
    let fx = Fixture::new(&[]);
    let src = format!("{}.txt", "a".repeat(150));
    let dst = format!("{}.txt", "b".repeat(150));
    fx.engine.create(&src, false, "long").unwrap();

    let moved = fx.engine.move_path(&src, &dst).unwrap();

    assert!(!fx.root().join(&src).exists());
    assert_eq!(fx.engine.read(&dst).unwrap(), "long");
    assert_eq!(fx.log_count("move_completed"), 1);
    assert!(moved.log.path.exists());
    assert!(fx.engine.list_moves().unwrap().contains(&dst));
}

#[test]
fn delete_and_rename_with_long_names_are_logged() {
    let fx = Fixture::new(&[]);
    let path = format!("{}/{}.txt", "d".repeat(120), "f".repeat(120));
    fx.engine.create(&path, false, "x").unwrap();

    fx.engine.delete(&path).unwrap();
    fx.engine.rename(&path, &format!("{}.md", "g".repeat(200))).unwrap();

    assert_eq!(fx.log_count("deletion"), 1);
    assert_eq!(fx.log_count("rename"), 1);
}

#[cfg(unix)]
#[test]
fn directory_listing_hides_symlinks_leaving_the_project() {
    let fx = Fixture::new(&[]);
    let outside = fx.base.join("secret.txt");
    fs::write(&outside, "TOPSECRET").unwrap();
    std::os::unix::fs::symlink(&outside, fx.root().join("link.txt")).unwrap();
    fx.engine.create("plain.txt", false, "plain").unwrap();

    assert!(matches!(fx.engine.read("link.txt"), Err(EngineError::InvalidPath { .. })));
    let tree = fx.engine.read_directory(".", true).unwrap();
    assert!(!tree["."].contains_key("link.txt"));
    assert_eq!(tree["."]["plain.txt"], "plain");
}

#[test]
fn move_missing_source_is_not_found() {
    let fx = Fixture::new(&[]);
    assert!(matches!(
        fx.engine.move_path("ghost.txt", "b.txt"),
        Err(EngineError::NotFound { .. })
    ));
}

#[test]
fn listings_without_logs_are_messages_not_errors() {
    let fx = Fixture::new(&[]);
    assert_eq!(
        fx.engine.list_deletions().unwrap(),
        "No items marked for deletion in Web project."
    );
    assert_eq!(
        fx.engine.list_renames().unwrap(),
        "No items staged for rename in Web project."
    );
    assert_eq!(
        fx.engine.list_moves().unwrap(),
        "No moves recorded in Web project."
    );
}

#[test]
fn projects_keep_separate_logs_and_staging() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    fs::create_dir_all(base.join("web")).unwrap();
    fs::create_dir_all(base.join("api")).unwrap();
    let web = MutationEngine::with_probe(
        ProjectProfile::new("Web", "web", "web"),
        base.join("web"),
        base,
        StubProbe::locking(&["shared.txt"]),
    )
    .unwrap();
    let api = MutationEngine::with_probe(
        ProjectProfile::new("Api", "api", "api"),
        base.join("api"),
        base,
        StubProbe::locking(&["shared.txt"]),
    )
    .unwrap();

    web.edit("shared.txt", "web body", EditMode::Replace).unwrap();
    api.edit("shared.txt", "api body", EditMode::Replace).unwrap();

    assert_eq!(
        fs::read_to_string(base.join(".staging/web/shared.txt")).unwrap(),
        "web body"
    );
    assert_eq!(
        fs::read_to_string(base.join(".staging/api/shared.txt")).unwrap(),
        "api body"
    );
    assert_eq!(web.list_staged_files().unwrap(), vec!["shared.txt"]);
}
