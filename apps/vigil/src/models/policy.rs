//! Rule policy: which extensions are governed and how they are classified,
//! which secret-like literals are flagged, and which rules are disabled.
//!
//! Key components:
//! - `ExtensionSets`: declaration-bearing source, script, and markup/template
//!   extensions. The governed set is their union.
//! - `SecretPattern`: case-insensitive regex plus a short description.
//! - `Policy`: the resolved bundle handed to `RuleSet::from_policy`.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
/// Role of a governed file, derived from its extension.
pub enum FileClass {
    Declaration,
    Script,
    Markup,
}

impl FileClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileClass::Declaration => "declaration",
            FileClass::Script => "script",
            FileClass::Markup => "markup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Extensions per file class, stored lowercase without the leading dot.
pub struct ExtensionSets {
    pub declaration: Vec<String>,
    pub script: Vec<String>,
    pub markup: Vec<String>,
}

impl Default for ExtensionSets {
    fn default() -> Self {
        ExtensionSets::new(vec!["cs".into()], vec!["ts".into(), "tsx".into()], vec!["cshtml".into()])
    }
}

impl ExtensionSets {
    pub fn new(declaration: Vec<String>, script: Vec<String>, markup: Vec<String>) -> Self {
        ExtensionSets {
            declaration: normalize(declaration),
            script: normalize(script),
            markup: normalize(markup),
        }
    }

    /// Governed extensions in class order, without duplicates.
    pub fn governed(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for ext in self.declaration.iter().chain(&self.script).chain(&self.markup) {
            if !out.contains(ext) {
                out.push(ext.clone());
            }
        }
        out
    }

    /// Classify a path. A file listed in several classes takes the first.
    pub fn classify(&self, path: impl AsRef<Path>) -> Option<FileClass> {
        let ext = extension_of(path.as_ref())?;
        if self.declaration.contains(&ext) {
            Some(FileClass::Declaration)
        } else if self.script.contains(&ext) {
            Some(FileClass::Script)
        } else if self.markup.contains(&ext) {
            Some(FileClass::Markup)
        } else {
            None
        }
    }

    pub fn is_governed(&self, path: impl AsRef<Path>) -> bool {
        self.classify(path).is_some()
    }
}

fn normalize(exts: Vec<String>) -> Vec<String> {
    exts.into_iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// A secret-like literal to flag. Matching is case-insensitive.
pub struct SecretPattern {
    pub pattern: String,
    pub description: String,
}

impl SecretPattern {
    pub fn new(pattern: &str, description: &str) -> Self {
        SecretPattern {
            pattern: pattern.to_string(),
            description: description.to_string(),
        }
    }
}

/// Built-in secret list used when the config declares no `[[secrets]]`.
pub fn default_secret_patterns() -> Vec<SecretPattern> {
    vec![
        SecretPattern::new(r"password123", "hardcoded test password"),
        SecretPattern::new(r#"admin["'\s]*:["'\s]*admin"#, "hardcoded admin credentials"),
        SecretPattern::new(r"test@example\.com", "hardcoded test email"),
        SecretPattern::new(r"default-secret-key", "hardcoded default secret"),
        SecretPattern::new(r"localhost.*password", "hardcoded localhost password"),
    ]
}

#[derive(Debug, Clone)]
/// Resolved rule configuration.
pub struct Policy {
    pub extensions: ExtensionSets,
    pub secrets: Vec<SecretPattern>,
    /// Rule ids removed from the registry.
    pub disabled: Vec<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            extensions: ExtensionSets::default(),
            secrets: default_secret_patterns(),
            disabled: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_defaults() {
        let sets = ExtensionSets::default();
        assert_eq!(sets.classify("src/A.cs"), Some(FileClass::Declaration));
        assert_eq!(sets.classify("web/app.TSX"), Some(FileClass::Script));
        assert_eq!(sets.classify("Views/Index.cshtml"), Some(FileClass::Markup));
        assert_eq!(sets.classify("README.md"), None);
        assert_eq!(sets.classify("Makefile"), None);
    }

    #[test]
    fn test_normalize_strips_dots_and_dedups_governed() {
        let sets = ExtensionSets::new(
            vec![".CS".into()],
            vec!["ts".into(), " .js ".into()],
            vec!["cs".into(), "html".into()],
        );
        assert_eq!(sets.declaration, vec!["cs"]);
        assert_eq!(sets.script, vec!["ts", "js"]);
        assert_eq!(sets.governed(), vec!["cs", "ts", "js", "html"]);
        // first class wins when an extension is listed twice
        assert_eq!(sets.classify("x.cs"), Some(FileClass::Declaration));
    }
}
