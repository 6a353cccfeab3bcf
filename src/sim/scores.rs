/// Leaderboard persistence — one plain-text file per mode.
///
/// ## File format:
///   One entry per line, `score name`. Name may contain spaces; the
///   score is everything before the first space. Lines that fail to
///   parse are skipped.
///
/// Files: high_scores_escape.txt / high_scores_hunter.txt. A finished
/// match appends its result, the file is rewritten sorted with the top
/// entries kept.

use std::path::PathBuf;

use super::world::Mode;

/// Entries kept on disk.
const KEEP: usize = 10;
/// Entries shown on the high-score screen.
pub const SHOWN: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreEntry {
    pub score: i32,
    pub name: String,
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

fn file_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Escape => "high_scores_escape.txt",
        Mode::Hunter => "high_scores_hunter.txt",
    }
}

fn data_dir() -> PathBuf {
    // 1. Try exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // Check if writable (system installs like /usr/games/ won't be)
            let test_path = parent.join(".write_test_mazebound");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home (~/.local/share/mazebound) for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/mazebound");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn score_path(mode: Mode) -> PathBuf {
    data_dir().join(file_name(mode))
}

// ══════════════════════════════════════════════════════════════
// Load / record
// ══════════════════════════════════════════════════════════════

/// Top `n` entries for the mode, best first. Missing file reads as empty.
pub fn top(mode: Mode, n: usize) -> Vec<ScoreEntry> {
    let candidates = [score_path(mode), PathBuf::from(file_name(mode))];
    for path in &candidates {
        if let Ok(content) = std::fs::read_to_string(path) {
            let mut entries = parse(&content);
            entries.truncate(n);
            return entries;
        }
    }
    Vec::new()
}

/// Merge one finished match into the mode's leaderboard and rewrite it.
/// Returns the updated top list (display length).
pub fn record(mode: Mode, name: &str, score: i32) -> Vec<ScoreEntry> {
    let mut entries = top(mode, KEEP);
    entries.push(ScoreEntry {
        score,
        name: clean_name(name),
    });
    sort_and_cap(&mut entries);

    // Best effort; the board still shows in-memory results when the
    // write fails.
    let _ = std::fs::write(score_path(mode), serialize(&entries));

    entries.truncate(SHOWN);
    entries
}

fn clean_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        "ANON".to_string()
    } else {
        trimmed.to_string()
    }
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn parse(content: &str) -> Vec<ScoreEntry> {
    let mut entries: Vec<ScoreEntry> = content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (score, name) = line.split_once(' ')?;
            Some(ScoreEntry {
                score: score.parse().ok()?,
                name: name.trim().to_string(),
            })
        })
        .collect();
    sort_and_cap(&mut entries);
    entries
}

fn serialize(entries: &[ScoreEntry]) -> String {
    let mut out = String::new();
    for e in entries {
        out.push_str(&format!("{} {}\n", e.score, e.name));
    }
    out
}

/// Highest score first; ties keep insertion order, so an older entry
/// outranks a new equal one.
fn sort_and_cap(entries: &mut Vec<ScoreEntry>) {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(KEEP);
}
