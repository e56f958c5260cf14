//! Configuration discovery and effective settings resolution.
//!
//! Vigil reads `vigil.toml|yaml|yml` from the repository root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `window_days`: 2
//! - `selection`: `auto` (history -> mtime -> all)
//! - `output`: `human`
//! - `report`: `CODE_VALIDATION_REPORT.md`
//! - `history_timeout_secs`: 10
//! - `max_file_bytes`: 2 MiB
//! - `ignore_dirs`: `node_modules`, `bin`, `obj`, `.git`, `packages`, `wwwroot/lib`
//! - `[extensions]`: declaration `cs`, script `ts|tsx`, markup `cshtml`
//! - `[[secrets]]`: built-in placeholder/test credential list
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::VigilError;
use crate::models::policy::{default_secret_patterns, ExtensionSets, Policy, SecretPattern};
use crate::select::SelectionMode;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_REPORT: &str = "CODE_VALIDATION_REPORT.md";
pub const DEFAULT_WINDOW_DAYS: u64 = 2;
pub const DEFAULT_HISTORY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;
const CONFIG_NAMES: [&str; 3] = ["vigil.toml", "vigil.yaml", "vigil.yml"];

pub fn default_ignore_dirs() -> Vec<String> {
    ["node_modules", "bin", "obj", ".git", "packages", "wwwroot/lib"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Extension classes under `[extensions]`.
pub struct ExtensionsCfg {
    pub declaration: Option<Vec<String>>,
    pub script: Option<Vec<String>>,
    pub markup: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Rule toggles under `[rules]`.
pub struct RulesCfg {
    #[serde(default)]
    pub disabled: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `vigil.toml|yaml`.
pub struct VigilConfig {
    pub window_days: Option<u64>,
    pub selection: Option<SelectionMode>,
    pub output: Option<String>,
    pub report: Option<String>,
    pub jobs: Option<usize>,
    pub history_timeout_secs: Option<u64>,
    pub max_file_bytes: Option<u64>,
    pub ignore_dirs: Option<Vec<String>>,
    pub extensions: Option<ExtensionsCfg>,
    pub secrets: Option<Vec<SecretPattern>>,
    pub rules: Option<RulesCfg>,
}

#[derive(Debug, Default, Clone)]
/// CLI-provided overrides; `None` defers to config and defaults.
pub struct Overrides {
    pub repo_root: Option<String>,
    pub window_days: Option<u64>,
    pub selection: Option<SelectionMode>,
    pub output: Option<String>,
    pub report: Option<String>,
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub root_exists: bool,
    pub config_path: Option<PathBuf>,
    pub window: Duration,
    pub selection: SelectionMode,
    pub output: String,
    pub report: String,
    pub jobs: Option<usize>,
    pub history_timeout: Duration,
    pub max_file_bytes: u64,
    pub ignore_dirs: Vec<String>,
    pub policy: Policy,
}

impl Effective {
    pub fn report_path(&self) -> PathBuf {
        self.repo_root.join(&self.report)
    }
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `vigil.toml|yaml|yml` or a `.git` entry is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) if !p.as_os_str().is_empty() => cur = p,
            _ => return start.to_path_buf(),
        }
    }
}

/// Load `VigilConfig` from `vigil.toml` or `vigil.yaml|yml` if present.
pub fn load_config(root: &Path) -> Result<Option<(PathBuf, VigilConfig)>, VigilError> {
    let toml_path = root.join("vigil.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).map_err(|e| VigilError::io(&toml_path, e))?;
        let cfg: VigilConfig = toml::from_str(&s).map_err(|e| VigilError::Toml {
            path: toml_path.clone(),
            source: e,
        })?;
        return Ok(Some((toml_path, cfg)));
    }
    for yml in ["vigil.yaml", "vigil.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).map_err(|e| VigilError::io(&p, e))?;
            let cfg: VigilConfig = serde_yaml::from_str(&s).map_err(|e| VigilError::Yaml {
                path: p.clone(),
                source: e,
            })?;
            return Ok(Some((p, cfg)));
        }
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &Overrides) -> Result<Effective, VigilError> {
    let start = PathBuf::from(cli.repo_root.as_deref().unwrap_or("."));
    if !start.is_dir() {
        // Missing root is informational for callers; nothing to load.
        return Ok(defaults_for(start, false));
    }
    let start = fs::canonicalize(&start).unwrap_or(start);
    let repo_root = detect_repo_root(&start);
    let (config_path, cfg) = match load_config(&repo_root)? {
        Some((p, c)) => (Some(p), c),
        None => (None, VigilConfig::default()),
    };

    let jobs = cli.jobs.or(cfg.jobs);
    if jobs == Some(0) {
        return Err(VigilError::Config("jobs must be at least 1".into()));
    }
    let output = cli
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    if output != "human" && output != "json" {
        return Err(VigilError::Config(format!(
            "unknown output mode '{}' (expected human|json)",
            output
        )));
    }

    let defaults = ExtensionSets::default();
    let ext_cfg = cfg.extensions.unwrap_or_default();
    let extensions = ExtensionSets::new(
        ext_cfg.declaration.unwrap_or(defaults.declaration),
        ext_cfg.script.unwrap_or(defaults.script),
        ext_cfg.markup.unwrap_or(defaults.markup),
    );
    let policy = Policy {
        extensions,
        secrets: cfg.secrets.unwrap_or_else(default_secret_patterns),
        disabled: cfg.rules.map(|r| r.disabled).unwrap_or_default(),
    };

    Ok(Effective {
        repo_root,
        root_exists: true,
        config_path,
        window: days(cli.window_days.or(cfg.window_days).unwrap_or(DEFAULT_WINDOW_DAYS)),
        selection: cli.selection.or(cfg.selection).unwrap_or_default(),
        output,
        report: cli
            .report
            .clone()
            .or(cfg.report)
            .unwrap_or_else(|| DEFAULT_REPORT.to_string()),
        jobs,
        history_timeout: Duration::from_secs(
            cfg.history_timeout_secs
                .unwrap_or(DEFAULT_HISTORY_TIMEOUT_SECS),
        ),
        max_file_bytes: cfg.max_file_bytes.unwrap_or(DEFAULT_MAX_FILE_BYTES),
        ignore_dirs: cfg.ignore_dirs.unwrap_or_else(default_ignore_dirs),
        policy,
    })
}

fn defaults_for(repo_root: PathBuf, root_exists: bool) -> Effective {
    Effective {
        repo_root,
        root_exists,
        config_path: None,
        window: days(DEFAULT_WINDOW_DAYS),
        selection: SelectionMode::default(),
        output: "human".to_string(),
        report: DEFAULT_REPORT.to_string(),
        jobs: None,
        history_timeout: Duration::from_secs(DEFAULT_HISTORY_TIMEOUT_SECS),
        max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        ignore_dirs: default_ignore_dirs(),
        policy: Policy::default(),
    }
}

fn days(n: u64) -> Duration {
    Duration::from_secs(n * 24 * 60 * 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn at(root: &Path) -> Overrides {
        Overrides {
            repo_root: root.to_str().map(String::from),
            ..Overrides::default()
        }
    }

    #[test]
    fn test_defaults_without_config() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let eff = resolve_effective(&at(dir.path())).unwrap();
        assert!(eff.config_path.is_none());
        assert_eq!(eff.window, days(2));
        assert_eq!(eff.selection, SelectionMode::Auto);
        assert_eq!(eff.output, "human");
        assert_eq!(eff.report, DEFAULT_REPORT);
        assert_eq!(eff.ignore_dirs, default_ignore_dirs());
        assert_eq!(eff.policy.extensions, ExtensionSets::default());
        assert_eq!(eff.policy.secrets.len(), 5);
    }

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("vigil.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
window_days = 7
selection = "mtime"
output = "json"
ignore_dirs = ["vendor"]
[extensions]
script = ["ts", "js"]
[[secrets]]
pattern = "hunter2"
description = "famous password"
[rules]
disabled = ["doc-comment-required"]
    "#
        )
        .unwrap();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();

        // Discovery walks up from a nested start directory
        let eff = resolve_effective(&at(&root.join("nested/deeper"))).unwrap();
        assert_eq!(eff.repo_root, fs::canonicalize(root).unwrap());
        assert_eq!(eff.window, days(7));
        assert_eq!(eff.selection, SelectionMode::Mtime);
        assert_eq!(eff.output, "json");
        assert_eq!(eff.ignore_dirs, vec!["vendor"]);
        assert_eq!(eff.policy.extensions.script, vec!["ts", "js"]);
        assert_eq!(eff.policy.extensions.declaration, vec!["cs"]);
        assert_eq!(eff.policy.secrets, vec![SecretPattern::new("hunter2", "famous password")]);
        assert_eq!(eff.policy.disabled, vec!["doc-comment-required"]);
    }

    #[test]
    fn test_load_yaml_and_cli_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("vigil.yaml"),
            "window_days: 5\noutput: json\nreport: out/report.md\njobs: 2\n",
        )
        .unwrap();
        let mut cli = at(root);
        cli.window_days = Some(1);
        cli.output = Some("human".into());
        let eff = resolve_effective(&cli).unwrap();
        assert_eq!(eff.window, days(1));
        assert_eq!(eff.output, "human");
        assert_eq!(eff.report, "out/report.md");
        assert_eq!(eff.jobs, Some(2));
        assert_eq!(
            eff.report_path(),
            fs::canonicalize(root).unwrap().join("out/report.md")
        );
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("vigil.toml"), "window_days = \"soon\"\n").unwrap();
        let err = resolve_effective(&at(dir.path())).unwrap_err();
        assert!(matches!(err, VigilError::Toml { .. }));

        fs::write(dir.path().join("vigil.toml"), "jobs = 0\n").unwrap();
        assert!(matches!(
            resolve_effective(&at(dir.path())),
            Err(VigilError::Config(_))
        ));
    }

    #[test]
    fn test_missing_root_is_informational() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let eff = resolve_effective(&at(&missing)).unwrap();
        assert!(!eff.root_exists);
        assert_eq!(eff.repo_root, missing);
    }
}
