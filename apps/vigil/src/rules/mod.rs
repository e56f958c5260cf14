//! Rule registry and the `Rule` capability.
//!
//! Each rule is stateless: it receives one file's relative path and content
//! and returns zero or more violations. Rules declare the file classes they
//! govern; the registry skips a rule for any other class, so content is read
//! once per file regardless of how many rules apply.
//!
//! Registry order (and therefore violation order within a file):
//! 1. `single-declaration-per-file`
//! 2. `doc-comment-required`
//! 3. `no-debug-output-statements`
//! 4. `no-hardcoded-secrets`
//! 5. `no-incomplete-implementation-markers`
//! 6. `no-inline-presentation-code`

pub mod debug_output;
pub mod declarations;
pub mod incomplete;
pub mod presentation;
pub mod secrets;

use crate::error::VigilError;
use crate::models::policy::{ExtensionSets, FileClass, Policy};
use crate::models::{Severity, Violation};
use regex::{Regex, RegexBuilder};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// File classes a rule applies to.
pub enum RuleScope {
    All,
    Only(&'static [FileClass]),
}

impl RuleScope {
    pub fn covers(&self, class: FileClass) -> bool {
        match self {
            RuleScope::All => true,
            RuleScope::Only(classes) => classes.contains(&class),
        }
    }

    pub fn label(&self) -> String {
        match self {
            RuleScope::All => "all".to_string(),
            RuleScope::Only(classes) => classes
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// A pure check over one file.
pub trait Rule: Send + Sync {
    /// Stable identifier, unique within a registry.
    fn id(&self) -> &'static str;
    fn severity(&self) -> Severity;
    fn scope(&self) -> RuleScope;
    fn description(&self) -> &'static str;
    fn evaluate(&self, path: &str, content: &str) -> Vec<Violation>;
}

/// Ordered collection of rules plus the extension classifier.
pub struct RuleSet {
    extensions: ExtensionSets,
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    pub fn new(extensions: ExtensionSets, rules: Vec<Box<dyn Rule>>) -> Self {
        RuleSet { extensions, rules }
    }

    /// Build the standard registry, dropping rules listed in `policy.disabled`.
    pub fn from_policy(policy: &Policy) -> Result<Self, VigilError> {
        let matcher = declarations::DeclarationMatcher::new()?;
        let all: Vec<Box<dyn Rule>> = vec![
            Box::new(declarations::SingleDeclaration::new(matcher.clone())),
            Box::new(declarations::DocCommentRequired::new(matcher)),
            Box::new(debug_output::DebugOutput::new()?),
            Box::new(secrets::HardcodedSecrets::new(&policy.secrets)?),
            Box::new(incomplete::IncompleteMarkers::new()?),
            Box::new(presentation::InlinePresentation::new("@")?),
        ];
        for id in &policy.disabled {
            if !all.iter().any(|r| r.id() == id) {
                return Err(VigilError::Config(format!(
                    "unknown rule id in [rules].disabled: '{}'",
                    id
                )));
            }
        }
        let rules = all
            .into_iter()
            .filter(|r| !policy.disabled.iter().any(|d| d == r.id()))
            .collect();
        Ok(RuleSet::new(policy.extensions.clone(), rules))
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    pub fn extensions(&self) -> &ExtensionSets {
        &self.extensions
    }

    /// Run every applicable rule in registry order.
    ///
    /// A rule that panics contributes nothing for this file; the panic is
    /// logged and the remaining rules still run.
    pub fn evaluate(&self, path: &str, content: &str) -> Vec<Violation> {
        let class = match self.extensions.classify(path) {
            Some(c) => c,
            None => return Vec::new(),
        };
        let mut out = Vec::new();
        for rule in &self.rules {
            if !rule.scope().covers(class) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| rule.evaluate(path, content))) {
                Ok(mut found) => out.append(&mut found),
                Err(payload) => {
                    error!(
                        rule = rule.id(),
                        path,
                        panic = panic_message(payload.as_ref()),
                        "rule panicked; result for this file treated as empty"
                    );
                }
            }
        }
        out
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// 1-based line number of a byte offset: newlines before it, plus one.
pub fn line_of(content: &str, offset: usize) -> usize {
    content.as_bytes()[..offset.min(content.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

pub(crate) fn compile(pattern: &str) -> Result<Regex, VigilError> {
    Regex::new(pattern).map_err(|e| VigilError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
    })
}

pub(crate) fn compile_ci(pattern: &str) -> Result<Regex, VigilError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| VigilError::InvalidPattern {
            pattern: pattern.to_string(),
            source: e,
        })
}

/// Violation stamped with the rule's id and severity.
pub(crate) fn violation(
    rule: &dyn Rule,
    path: &str,
    line_number: usize,
    violation_type: &str,
    message: String,
    suggestion: String,
) -> Violation {
    Violation {
        file_path: path.to_string(),
        line_number,
        violation_type: violation_type.to_string(),
        severity: rule.severity(),
        rule_id: rule.id().to_string(),
        message,
        suggestion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Exploding;

    impl Rule for Exploding {
        fn id(&self) -> &'static str {
            "exploding"
        }
        fn severity(&self) -> Severity {
            Severity::Error
        }
        fn scope(&self) -> RuleScope {
            RuleScope::All
        }
        fn description(&self) -> &'static str {
            "always panics"
        }
        fn evaluate(&self, _path: &str, _content: &str) -> Vec<Violation> {
            panic!("boom")
        }
    }

    #[test]
    fn test_line_of_counts_preceding_newlines() {
        let s = "a\nb\n\nsecret";
        assert_eq!(line_of(s, 0), 1);
        assert_eq!(line_of(s, 2), 2);
        assert_eq!(line_of(s, s.find("secret").unwrap()), 4);
        assert_eq!(line_of(s, 10_000), 4);
    }

    #[test]
    fn test_rule_ids_are_unique_and_ordered() {
        let set = RuleSet::from_policy(&Policy::default()).unwrap();
        let ids: Vec<_> = set.rules().iter().map(|r| r.id()).collect();
        assert_eq!(
            ids,
            vec![
                "single-declaration-per-file",
                "doc-comment-required",
                "no-debug-output-statements",
                "no-hardcoded-secrets",
                "no-incomplete-implementation-markers",
                "no-inline-presentation-code",
            ]
        );
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    }

    #[test]
    fn test_disabled_rules_are_removed_and_unknown_rejected() {
        let mut policy = Policy::default();
        policy.disabled = vec!["doc-comment-required".into()];
        let set = RuleSet::from_policy(&policy).unwrap();
        assert!(set.rules().iter().all(|r| r.id() != "doc-comment-required"));

        policy.disabled = vec!["no-such-rule".into()];
        assert!(matches!(
            RuleSet::from_policy(&policy),
            Err(VigilError::Config(_))
        ));
    }

    #[test]
    fn test_ungoverned_extension_yields_nothing() {
        let set = RuleSet::from_policy(&Policy::default()).unwrap();
        let found = set.evaluate("notes.txt", "password123 // TODO console.log(1)");
        assert!(found.is_empty());
    }

    #[test]
    fn test_scope_filters_rules_by_class() {
        let set = RuleSet::from_policy(&Policy::default()).unwrap();
        // console call in a declaration file is not a script violation
        let found = set.evaluate("A.cs", "/// doc\npublic class A { void F() { console.log(1); } }\n");
        assert!(found.is_empty());
        let found = set.evaluate("a.ts", "console.log(1);\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rule_id, "no-debug-output-statements");
    }

    #[test]
    fn test_panicking_rule_does_not_abort_file() {
        let base = RuleSet::from_policy(&Policy::default()).unwrap();
        let mut rules: Vec<Box<dyn Rule>> = vec![Box::new(Exploding)];
        rules.extend(base.rules.into_iter());
        let set = RuleSet::new(ExtensionSets::default(), rules);
        let found = set.evaluate("a.ts", "console.debug('x')\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rule_id, "no-debug-output-statements");
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = compile("(unclosed").unwrap_err();
        assert!(matches!(err, VigilError::InvalidPattern { .. }));
    }
}
