//! Shared data models for validation results, rule policy, and work items.

pub mod policy;
pub mod work;

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
/// Violation severity. Ordering is `Info < Warning < Error`.
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Display order used by reports: most severe first.
    pub const DESCENDING: [Severity; 3] = [Severity::Error, Severity::Warning, Severity::Info];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// Title-case label used in section headings.
    pub fn title(&self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A single finding produced by one rule evaluation.
pub struct Violation {
    pub file_path: String,
    pub line_number: usize,
    pub violation_type: String,
    pub severity: Severity,
    pub rule_id: String,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Per-severity violation counts.
pub struct SeverityCounts {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Error => self.errors,
            Severity::Warning => self.warnings,
            Severity::Info => self.infos,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A candidate that could not be read; recorded, never fatal.
pub struct SkippedFile {
    pub file_path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
/// Aggregate outcome of one validation pass.
pub struct ValidationResult {
    pub files_checked: usize,
    pub violations: Vec<Violation>,
    pub counts: SeverityCounts,
    pub files_with_errors: usize,
    pub compliance_score: f64,
    pub skipped: Vec<SkippedFile>,
}

impl ValidationResult {
    /// Build the aggregate from violations in discovery order.
    pub fn new(files_checked: usize, violations: Vec<Violation>, skipped: Vec<SkippedFile>) -> Self {
        let mut counts = SeverityCounts::default();
        for v in &violations {
            match v.severity {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Info => counts.infos += 1,
            }
        }
        let files_with_errors = violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .map(|v| v.file_path.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        ValidationResult {
            files_checked,
            compliance_score: compliance_score(files_with_errors, files_checked),
            violations,
            counts,
            files_with_errors,
            skipped,
        }
    }

    /// Result for a pass that had nothing to check.
    pub fn empty() -> Self {
        ValidationResult::new(0, Vec::new(), Vec::new())
    }

    pub fn total_violations(&self) -> usize {
        self.violations.len()
    }

    /// Violations of one severity, in the preserved aggregate order.
    pub fn of_severity(&self, severity: Severity) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.severity == severity)
    }

    /// Quality gate: true when any error-severity violation exists.
    pub fn has_errors(&self) -> bool {
        self.counts.errors > 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.has_errors() {
            1
        } else {
            0
        }
    }
}

/// `100 - files_with_errors / max(files_checked, 1) * 100`, floored at 0 and
/// rounded to one decimal.
pub fn compliance_score(files_with_errors: usize, files_checked: usize) -> f64 {
    let ratio = files_with_errors as f64 / files_checked.max(1) as f64;
    let score = (100.0 - ratio * 100.0).max(0.0);
    (score * 10.0).round() / 10.0
}
