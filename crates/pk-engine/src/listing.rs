// listing.rs: Text summaries of pending and completed operations.

use std::fmt::Write;

use pk_audit::{DeletionSummary, LogFile, MoveSummary, RenameSummary};

/// Completed moves shown by `list_moves`, newest last.
pub const RECENT_MOVES: usize = 5;

pub fn deletions(label: &str, subdir: &str, logs: &[LogFile<DeletionSummary>]) -> String {
    if logs.is_empty() {
        return format!("No items marked for deletion in {} project.", label);
    }

    let mut out = format!("Items marked for deletion in {} project:\n\n", label);
    for (i, log) in logs.iter().enumerate() {
        match &log.parsed {
            Ok(s) => {
                let _ = write!(
                    out,
                    "{}. {} ({})\n   Marked: {}\n   Log: {}\n\n",
                    i + 1,
                    s.path,
                    s.subject_type,
                    s.marked_at,
                    log.file_name
                );
            }
            Err(e) => {
                let _ = write!(out, "{}. {}: Error reading log ({})\n\n", i + 1, log.file_name, e);
            }
        }
    }
    let _ = write!(
        out,
        "Deletion logs are in logs/{}/deletion/\nRemove each log after carrying out its deletion.",
        subdir
    );
    out
}

pub fn renames(label: &str, subdir: &str, logs: &[LogFile<RenameSummary>]) -> String {
    if logs.is_empty() {
        return format!("No items staged for rename in {} project.", label);
    }

    let mut out = format!("Items staged for rename in {} project:\n\n", label);
    for (i, log) in logs.iter().enumerate() {
        match &log.parsed {
            Ok(s) => {
                let _ = write!(
                    out,
                    "{}. {} -> {} ({})\n   Staged: {}\n",
                    i + 1,
                    s.current_name,
                    s.new_name,
                    s.subject_type,
                    s.staged_at
                );
                if s.conflict {
                    out.push_str("   WARNING: Destination already exists!\n");
                }
                let _ = write!(out, "   Log: {}\n\n", log.file_name);
            }
            Err(e) => {
                let _ = write!(out, "{}. {}: Error reading log ({})\n\n", i + 1, log.file_name, e);
            }
        }
    }
    let _ = write!(
        out,
        "Rename logs are in logs/{}/rename/\nRemove each log after carrying out its rename.",
        subdir
    );
    out
}

/// `completed` is in file-name order; only the last [`RECENT_MOVES`] are shown.
pub fn moves(
    label: &str,
    subdir: &str,
    completed: &[LogFile<MoveSummary>],
    legacy: &[LogFile<MoveSummary>],
) -> String {
    if completed.is_empty() && legacy.is_empty() {
        return format!("No moves recorded in {} project.", label);
    }

    let mut out = String::new();
    if !completed.is_empty() {
        let start = completed.len().saturating_sub(RECENT_MOVES);
        let _ = write!(
            out,
            "Recent completed moves in {} project ({} of {}):\n\n",
            label,
            completed.len() - start,
            completed.len()
        );
        for (i, log) in completed[start..].iter().enumerate() {
            push_move(&mut out, i + 1, log);
        }
        let _ = writeln!(out, "Move logs are in logs/{}/move_completed/\n", subdir);
    }

    if !legacy.is_empty() {
        let _ = write!(
            out,
            "Staged moves awaiting manual action in {} project:\n\n",
            label
        );
        for (i, log) in legacy.iter().enumerate() {
            push_move(&mut out, i + 1, log);
        }
        let _ = writeln!(out, "Staged move logs are in logs/{}/move/\n", subdir);
    }

    out.push_str("Move logs are kept as an audit trail; remove them once no longer needed.");
    out
}

fn push_move(out: &mut String, n: usize, log: &LogFile<MoveSummary>) {
    match &log.parsed {
        Ok(s) => {
            let _ = write!(
                out,
                "{}. {} -> {} ({})\n   At: {}\n",
                n, s.source, s.destination, s.subject_type, s.timestamp
            );
            if s.conflict {
                out.push_str("   WARNING: Destination already exists!\n");
            }
            let _ = write!(out, "   Log: {}\n\n", log.file_name);
        }
        Err(e) => {
            let _ = write!(out, "{}. {}: Error reading log ({})\n\n", n, log.file_name, e);
        }
    }
}
