//! `no-incomplete-implementation-markers`: unimplemented throws and
//! TODO/FIXME/HACK comments in declaration-bearing sources.

use super::{compile_ci, line_of, violation, Rule, RuleScope};
use crate::error::VigilError;
use crate::models::policy::FileClass;
use crate::models::{Severity, Violation};
use regex::Regex;

const MARKERS: [(&str, &str); 4] = [
    (r"throw\s+new\s+NotImplementedException", "NotImplementedException found"),
    (r"//\s*TODO", "TODO comment found"),
    (r"//\s*FIXME", "FIXME comment found"),
    (r"//\s*HACK", "HACK comment found"),
];

pub struct IncompleteMarkers {
    markers: Vec<(Regex, &'static str)>,
}

impl IncompleteMarkers {
    pub fn new() -> Result<Self, VigilError> {
        let markers = MARKERS
            .iter()
            .map(|(pat, desc)| Ok((compile_ci(pat)?, *desc)))
            .collect::<Result<Vec<_>, VigilError>>()?;
        Ok(IncompleteMarkers { markers })
    }
}

impl Rule for IncompleteMarkers {
    fn id(&self) -> &'static str {
        "no-incomplete-implementation-markers"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Only(&[FileClass::Declaration])
    }

    fn description(&self) -> &'static str {
        "No unimplemented throws or TODO/FIXME/HACK markers"
    }

    fn evaluate(&self, path: &str, content: &str) -> Vec<Violation> {
        let mut out = Vec::new();
        for (re, description) in &self.markers {
            for m in re.find_iter(content) {
                out.push(violation(
                    self,
                    path,
                    line_of(content, m.start()),
                    "incomplete_implementation",
                    format!("Incomplete implementation: {}", description),
                    "Complete the implementation before committing".to_string(),
                ));
            }
        }
        out
    }
}
