//! `no-hardcoded-secrets`: secret-like literals in any governed file.
//!
//! The pattern list comes from policy; every pattern is compiled
//! case-insensitive. Matches are reported pattern by pattern.

use super::{compile_ci, line_of, violation, Rule, RuleScope};
use crate::error::VigilError;
use crate::models::policy::SecretPattern;
use crate::models::{Severity, Violation};
use regex::Regex;

pub struct HardcodedSecrets {
    patterns: Vec<(Regex, String)>,
}

impl HardcodedSecrets {
    pub fn new(patterns: &[SecretPattern]) -> Result<Self, VigilError> {
        let patterns = patterns
            .iter()
            .map(|p| Ok((compile_ci(&p.pattern)?, p.description.clone())))
            .collect::<Result<Vec<_>, VigilError>>()?;
        Ok(HardcodedSecrets { patterns })
    }
}

impl Rule for HardcodedSecrets {
    fn id(&self) -> &'static str {
        "no-hardcoded-secrets"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn scope(&self) -> RuleScope {
        RuleScope::All
    }

    fn description(&self) -> &'static str {
        "No placeholder passwords, default keys, or test credentials"
    }

    fn evaluate(&self, path: &str, content: &str) -> Vec<Violation> {
        let mut out = Vec::new();
        for (re, description) in &self.patterns {
            for m in re.find_iter(content) {
                out.push(violation(
                    self,
                    path,
                    line_of(content, m.start()),
                    "hardcoded_secret",
                    format!("Hardcoded secret detected: {}", description),
                    "Move to configuration or environment variables".to_string(),
                ));
            }
        }
        out
    }
}
