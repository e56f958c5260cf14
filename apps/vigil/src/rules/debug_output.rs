//! `no-debug-output-statements`: console calls left in script files.

use super::{compile, line_of, violation, Rule, RuleScope};
use crate::error::VigilError;
use crate::models::policy::FileClass;
use crate::models::{Severity, Violation};
use regex::Regex;

const CONSOLE_PATTERN: &str = r"console\.(log|error|warn|info|debug)\s*\(";

pub struct DebugOutput {
    re: Regex,
}

impl DebugOutput {
    pub fn new() -> Result<Self, VigilError> {
        Ok(DebugOutput {
            re: compile(CONSOLE_PATTERN)?,
        })
    }
}

impl Rule for DebugOutput {
    fn id(&self) -> &'static str {
        "no-debug-output-statements"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Only(&[FileClass::Script])
    }

    fn description(&self) -> &'static str {
        "No console/debug output calls in shipped scripts"
    }

    fn evaluate(&self, path: &str, content: &str) -> Vec<Violation> {
        self.re
            .captures_iter(content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let method = caps.get(1)?.as_str();
                Some(violation(
                    self,
                    path,
                    line_of(content, whole.start()),
                    "production_debug_code",
                    format!("Console statement found: console.{}()", method),
                    "Replace with proper logging service or remove for production".to_string(),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_each_console_call_with_line() {
        let src = "const a = 1;\nconsole.log('a');\nfunction f() {\n  console.error (e);\n}\nconsole.table(x);\n";
        let found = DebugOutput::new().unwrap().evaluate("app.ts", src);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].line_number, 2);
        assert_eq!(found[0].message, "Console statement found: console.log()");
        assert_eq!(found[1].line_number, 4);
        assert_eq!(found[1].message, "Console statement found: console.error()");
    }

    #[test]
    fn test_clean_script_passes() {
        let found = DebugOutput::new()
            .unwrap()
            .evaluate("app.tsx", "logger.info('ok');\nconst consoleLog = 1;\n");
        assert!(found.is_empty());
    }
}
