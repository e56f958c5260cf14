//! Candidate selection: which governed files a validation pass inspects.
//!
//! Fallback chain for `auto` selection:
//! 1. Version-control history (`git log --since`) bounded by the recency
//!    window and a timeout; paths must still exist on disk.
//! 2. Filesystem walk keeping files whose modification time falls inside
//!    the window.
//! 3. Exhaustive walk of every governed file.
//!
//! Walks prune configured ignore directories by whole path components.
//! Every stage orders its results newest first, ties by path.

use crate::error::VigilError;
use crate::models::policy::ExtensionSets;
use crate::models::SkippedFile;
use crate::utils::{self, RunError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
/// Where the selection chain starts.
pub enum SelectionMode {
    /// history -> mtime -> all
    #[default]
    Auto,
    /// mtime -> all
    Mtime,
    /// all
    All,
}

impl FromStr for SelectionMode {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SelectionMode::Auto),
            "mtime" => Ok(SelectionMode::Mtime),
            "all" => Ok(SelectionMode::All),
            other => Err(VigilError::Config(format!(
                "unknown selection mode '{}' (expected auto|mtime|all)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Which stage produced the candidates.
pub enum SelectionSource {
    Explicit,
    History,
    Mtime,
    All,
}

impl SelectionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionSource::Explicit => "explicit",
            SelectionSource::History => "history",
            SelectionSource::Mtime => "mtime",
            SelectionSource::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Path relative to the project root, `/`-separated.
    pub rel: String,
    pub abs: PathBuf,
}

#[derive(Debug)]
pub struct Selection {
    pub source: SelectionSource,
    pub files: Vec<Candidate>,
    /// Paths dropped during discovery (vanished, unreadable metadata).
    pub errors: Vec<SkippedFile>,
}

pub struct Selector {
    root: PathBuf,
    extensions: ExtensionSets,
    ignore_dirs: Vec<String>,
    window: Duration,
    history_timeout: Duration,
}

impl Selector {
    pub fn new(
        root: PathBuf,
        extensions: ExtensionSets,
        ignore_dirs: Vec<String>,
        window: Duration,
        history_timeout: Duration,
    ) -> Self {
        let ignore_dirs = ignore_dirs
            .into_iter()
            .map(|d| d.trim().trim_matches('/').replace('\\', "/"))
            .filter(|d| !d.is_empty())
            .collect();
        Selector {
            root,
            extensions,
            ignore_dirs,
            window,
            history_timeout,
        }
    }

    /// Run the fallback chain starting at `mode`.
    pub fn select(&self, mode: SelectionMode, now: SystemTime) -> Selection {
        let mut errors = Vec::new();
        if mode == SelectionMode::Auto {
            match self.from_history() {
                Ok(files) if !files.is_empty() => {
                    info!(count = files.len(), "selected candidates from history");
                    return Selection {
                        source: SelectionSource::History,
                        files,
                        errors,
                    };
                }
                Ok(_) => debug!("history query returned no governed files"),
                Err(e) => warn!(error = %e, "history query unavailable; falling back to timestamps"),
            }
        }
        if mode != SelectionMode::All {
            let (files, mut errs) = self.recent_by_mtime(now);
            errors.append(&mut errs);
            if !files.is_empty() {
                info!(count = files.len(), "selected candidates by modification time");
                return Selection {
                    source: SelectionSource::Mtime,
                    files,
                    errors,
                };
            }
            debug!("no governed files modified inside the window");
        }
        let (files, mut errs) = self.all();
        errors.append(&mut errs);
        info!(count = files.len(), "selected all governed files");
        Selection {
            source: SelectionSource::All,
            files,
            errors,
        }
    }

    /// Validate exactly the given paths or glob patterns, relative to root.
    pub fn explicit(&self, inputs: &[String]) -> Selection {
        let mut files = Vec::new();
        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        for input in inputs {
            let mut paths: Vec<PathBuf> = Vec::new();
            if input.contains(['*', '?', '[']) {
                let pattern = format!(
                    "{}/{}",
                    glob::Pattern::escape(&self.root.to_string_lossy()),
                    input.trim_start_matches("./")
                );
                match glob::glob(&pattern) {
                    Ok(entries) => paths.extend(entries.flatten()),
                    Err(e) => {
                        errors.push(SkippedFile {
                            file_path: input.clone(),
                            reason: format!("bad glob pattern: {}", e),
                        });
                        continue;
                    }
                }
            } else {
                let p = self.root.join(input);
                if !p.is_file() {
                    warn!(path = %input, "explicit path not found");
                    errors.push(SkippedFile {
                        file_path: input.clone(),
                        reason: "file not found".to_string(),
                    });
                    continue;
                }
                paths.push(p);
            }
            for abs in paths {
                if !abs.is_file() || !self.extensions.is_governed(&abs) {
                    continue;
                }
                let rel = utils::rel_display(&self.root, &abs);
                if seen.insert(rel.clone()) {
                    files.push(Candidate { rel, abs });
                }
            }
        }
        Selection {
            source: SelectionSource::Explicit,
            files,
            errors,
        }
    }

    /// Governed files added or modified in commits inside the window.
    pub fn from_history(&self) -> Result<Vec<Candidate>, VigilError> {
        let since = format!("--since={} seconds ago", self.window.as_secs());
        let mut cmd = Command::new("git");
        // unquoted paths so non-ASCII names resolve on disk
        cmd.args(["-c", "core.quotePath=false", "-C"])
            .arg(&self.root)
            .args([
                "log",
                since.as_str(),
                "--name-only",
                "--pretty=format:",
                "--diff-filter=AM",
                "--relative",
            ]);
        let out = utils::run_with_timeout(&mut cmd, self.history_timeout).map_err(|e| match e {
            RunError::TimedOut(d) => VigilError::HistoryTimeout(d),
            other => VigilError::History(other.to_string()),
        })?;
        if !out.status.success() {
            return Err(VigilError::History(out.stderr.trim().to_string()));
        }
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for line in out.stdout.lines() {
            let rel = line.trim();
            if rel.is_empty() || !seen.insert(rel.to_string()) {
                continue;
            }
            if !self.extensions.is_governed(rel) || self.is_ignored(rel) {
                continue;
            }
            let abs = self.root.join(rel);
            // still present on disk; vanished files are dropped
            if let Some(mtime) = modified(&abs) {
                found.push((
                    Candidate {
                        rel: rel.to_string(),
                        abs,
                    },
                    mtime,
                ));
            }
        }
        Ok(newest_first(found))
    }

    /// Governed files whose modification time is after `now - window`.
    pub fn recent_by_mtime(&self, now: SystemTime) -> (Vec<Candidate>, Vec<SkippedFile>) {
        let cutoff = now.checked_sub(self.window).unwrap_or(SystemTime::UNIX_EPOCH);
        let (walked, errors) = self.walk();
        let mut recent = Vec::new();
        let mut errors = errors;
        for c in walked {
            match std::fs::metadata(&c.abs).and_then(|m| m.modified()) {
                Ok(mtime) if mtime > cutoff => recent.push((c, mtime)),
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %c.rel, error = %e, "could not read modification time");
                    errors.push(SkippedFile {
                        file_path: c.rel,
                        reason: e.to_string(),
                    });
                }
            }
        }
        (newest_first(recent), errors)
    }

    /// Every governed file under root, newest first.
    pub fn all(&self) -> (Vec<Candidate>, Vec<SkippedFile>) {
        let (walked, errors) = self.walk();
        let dated = walked
            .into_iter()
            .map(|c| {
                let mtime = modified(&c.abs).unwrap_or(SystemTime::UNIX_EPOCH);
                (c, mtime)
            })
            .collect();
        (newest_first(dated), errors)
    }

    fn walk(&self) -> (Vec<Candidate>, Vec<SkippedFile>) {
        let mut files = Vec::new();
        let mut errors = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || !self.is_ignored(&utils::rel_display(&self.root, e.path()))
            });
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| utils::rel_display(&self.root, p))
                        .unwrap_or_default();
                    warn!(path = %path, error = %e, "skipping unreadable entry");
                    errors.push(SkippedFile {
                        file_path: path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.extensions.is_governed(entry.path()) {
                continue;
            }
            files.push(Candidate {
                rel: utils::rel_display(&self.root, entry.path()),
                abs: entry.into_path(),
            });
        }
        (files, errors)
    }

    /// True when `rel` is, or lies inside, an ignored directory.
    fn is_ignored(&self, rel: &str) -> bool {
        let rel = rel.trim_start_matches("./");
        self.ignore_dirs.iter().any(|dir| {
            rel == dir
                || rel.starts_with(&format!("{}/", dir))
                || rel.ends_with(&format!("/{}", dir))
                || rel.contains(&format!("/{}/", dir))
        })
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    let meta = std::fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }
    meta.modified().ok()
}

fn newest_first(mut found: Vec<(Candidate, SystemTime)>) -> Vec<Candidate> {
    found.sort_by(|(a, ta), (b, tb)| tb.cmp(ta).then_with(|| a.rel.cmp(&b.rel)));
    found.into_iter().map(|(c, _)| c).collect()
}
