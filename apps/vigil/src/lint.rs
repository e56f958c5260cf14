//! Lint runner: reads candidates, applies the rule set, aggregates and
//! scores, then renders the report.
//!
//! Produces a `LintRun` with the `ValidationResult` and the rendered
//! document. Nothing is written here; persisting the report is the caller's
//! step, so a run can be discarded without side effects.

use crate::config::Effective;
use crate::error::VigilError;
use crate::models::{SkippedFile, ValidationResult, Violation};
use crate::report;
use crate::rules::RuleSet;
use crate::select::{Candidate, SelectionSource, Selector};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::time::SystemTime;
use tracing::{info, warn};

/// Supplies file contents to the aggregator.
pub trait SourceReader: Send + Sync {
    fn read(&self, file: &Candidate) -> Result<String, VigilError>;
}

/// Reads from disk with a size cap. Invalid UTF-8 is replaced, not rejected.
///
/// Reads are bounded by size, not by time: a hung network mount blocks the
/// worker thread that reads from it.
pub struct FsReader {
    max_bytes: u64,
}

impl FsReader {
    pub fn new(max_bytes: u64) -> Self {
        FsReader { max_bytes }
    }
}

impl SourceReader for FsReader {
    fn read(&self, file: &Candidate) -> Result<String, VigilError> {
        let meta = fs::metadata(&file.abs).map_err(|e| VigilError::io(&file.abs, e))?;
        if meta.len() > self.max_bytes {
            return Err(VigilError::TooLarge {
                path: file.abs.clone(),
                limit: self.max_bytes,
            });
        }
        let bytes = fs::read(&file.abs).map_err(|e| VigilError::io(&file.abs, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Outcome of one full pass.
pub struct LintRun {
    pub source: Option<SelectionSource>,
    pub candidates: Vec<String>,
    pub result: ValidationResult,
    pub report: String,
}

/// Evaluate every file with every rule.
///
/// Files are processed in parallel; the indexed collect keeps input order,
/// so violations come out file by file, rule by rule, match by match.
/// Unreadable files are recorded as skipped and do not count as checked.
pub fn evaluate_files(
    files: &[Candidate],
    rules: &RuleSet,
    reader: &dyn SourceReader,
) -> ValidationResult {
    let per_file: Vec<Result<Vec<Violation>, SkippedFile>> = files
        .par_iter()
        .map(|file| match reader.read(file) {
            Ok(content) => Ok(rules.evaluate(&file.rel, &content)),
            Err(e) => {
                warn!(path = %file.rel, error = %e, "skipping unreadable file");
                Err(SkippedFile {
                    file_path: file.rel.clone(),
                    reason: e.to_string(),
                })
            }
        })
        .collect();

    let mut checked = 0usize;
    let mut violations = Vec::new();
    let mut skipped = Vec::new();
    for outcome in per_file {
        match outcome {
            Ok(mut found) => {
                checked += 1;
                violations.append(&mut found);
            }
            Err(s) => skipped.push(s),
        }
    }
    ValidationResult::new(checked, violations, skipped)
}

/// `evaluate_files` on a dedicated pool when `jobs` is set.
pub fn evaluate_with_jobs(
    files: &[Candidate],
    rules: &RuleSet,
    reader: &dyn SourceReader,
    jobs: Option<usize>,
) -> Result<ValidationResult, VigilError> {
    match jobs {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
            Ok(pool.install(|| evaluate_files(files, rules, reader)))
        }
        None => Ok(evaluate_files(files, rules, reader)),
    }
}

/// Run the whole pipeline: select, evaluate, score, render.
///
/// `explicit` bypasses the selector when non-empty. A missing root or an
/// empty candidate set yields an empty result with no source.
pub fn run_lint(eff: &Effective, explicit: &[String]) -> Result<LintRun, VigilError> {
    let rules = RuleSet::from_policy(&eff.policy)?;
    if !eff.root_exists {
        let result = ValidationResult::empty();
        return Ok(LintRun {
            source: None,
            candidates: Vec::new(),
            report: report::render(&result),
            result,
        });
    }

    let selector = Selector::new(
        eff.repo_root.clone(),
        eff.policy.extensions.clone(),
        eff.ignore_dirs.clone(),
        eff.window,
        eff.history_timeout,
    );
    let selection = if explicit.is_empty() {
        selector.select(eff.selection, SystemTime::now())
    } else {
        selector.explicit(explicit)
    };

    let reader = FsReader::new(eff.max_file_bytes);
    let evaluated = evaluate_with_jobs(&selection.files, &rules, &reader, eff.jobs)?;
    let mut skipped = selection.errors;
    skipped.extend(evaluated.skipped);
    let candidates = surviving(&selection.files, &skipped);
    let result = ValidationResult::new(evaluated.files_checked, evaluated.violations, skipped);
    info!(
        source = selection.source.as_str(),
        files = result.files_checked,
        violations = result.total_violations(),
        score = result.compliance_score,
        "validation pass finished"
    );

    let source = if selection.files.is_empty() {
        None
    } else {
        Some(selection.source)
    };
    Ok(LintRun {
        source,
        candidates,
        report: report::render(&result),
        result,
    })
}

/// Paths of selected files that were actually read.
fn surviving(files: &[Candidate], skipped: &[SkippedFile]) -> Vec<String> {
    let dropped: HashSet<&str> = skipped.iter().map(|s| s.file_path.as_str()).collect();
    files
        .iter()
        .filter(|c| !dropped.contains(c.rel.as_str()))
        .map(|c| c.rel.clone())
        .collect()
}
