//! Markdown report rendering.
//!
//! `render` is pure: the same `ValidationResult` always yields the same
//! bytes. No timestamp or selection metadata is embedded. `persist` is the
//! only function here that touches the filesystem.

use crate::error::VigilError;
use crate::models::{Severity, ValidationResult};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Render the validation report document.
pub fn render(res: &ValidationResult) -> String {
    let mut doc = String::new();
    // Writing into a String cannot fail.
    let _ = write_doc(&mut doc, res);
    doc
}

fn write_doc(doc: &mut String, res: &ValidationResult) -> std::fmt::Result {
    writeln!(doc, "# Code Validation Report")?;
    writeln!(doc)?;
    writeln!(doc, "**Files Checked**: {}", res.files_checked)?;
    writeln!(doc, "**Compliance Score**: {:.1}/100", res.compliance_score)?;
    writeln!(doc, "**Total Violations**: {}", res.total_violations())?;
    writeln!(doc)?;
    writeln!(doc, "## Summary")?;
    writeln!(doc)?;
    writeln!(doc, "- **Errors**: {}", res.counts.errors)?;
    writeln!(doc, "- **Warnings**: {}", res.counts.warnings)?;
    writeln!(doc, "- **Info**: {}", res.counts.infos)?;
    writeln!(doc)?;

    if res.violations.is_empty() {
        writeln!(doc, "## SUCCESS: No Violations Found")?;
        writeln!(doc)?;
        writeln!(doc, "All checked files comply with coding standards!")?;
        return Ok(());
    }

    writeln!(doc, "## Violations")?;
    writeln!(doc)?;
    for sev in Severity::DESCENDING {
        if res.counts.get(sev) == 0 {
            continue;
        }
        writeln!(
            doc,
            "### {}: {} Issues",
            sev.as_str().to_ascii_uppercase(),
            sev.title()
        )?;
        writeln!(doc)?;
        for v in res.of_severity(sev) {
            writeln!(doc, "**File**: `{}:{}`", v.file_path, v.line_number)?;
            writeln!(doc, "**Rule**: {}", v.rule_id)?;
            writeln!(doc, "**Message**: {}", v.message)?;
            writeln!(doc, "**Suggestion**: {}", v.suggestion)?;
            writeln!(doc)?;
        }
    }
    Ok(())
}

/// Write `doc` to `path`, creating parent directories as needed.
pub fn persist(path: &Path, doc: &str) -> Result<(), VigilError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| VigilError::io(parent, e))?;
        }
    }
    fs::write(path, doc).map_err(|e| VigilError::io(path, e))
}
