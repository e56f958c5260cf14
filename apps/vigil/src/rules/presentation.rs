//! `no-inline-presentation-code`: styling and behaviour embedded in
//! markup/template files.
//!
//! Four checks run in this order, each reported with its own violation type:
//! - `<style>` blocks with non-whitespace content (`inline_css`)
//! - `style="..."` attributes without a template expression (`inline_style_attribute`)
//! - `<script>` blocks with a body and no `src` (`inline_javascript`)
//! - `on*="..."` event-handler attributes (`inline_event_handler`); a
//!   prefixed attribute such as `data-online` is not a handler
//!
//! A script block whose body only binds a template value
//! (`var x = @Model.X`) is allowed.

use super::{compile, compile_ci, line_of, violation, Rule, RuleScope};
use crate::error::VigilError;
use crate::models::policy::FileClass;
use crate::models::{Severity, Violation};
use regex::Regex;

pub struct InlinePresentation {
    marker: String,
    style_block: Regex,
    style_attr: Regex,
    script_block: Regex,
    script_src: Regex,
    template_binding: Regex,
    event_handler: Regex,
}

impl InlinePresentation {
    /// `marker` is the template-expression prefix (`@` for Razor).
    pub fn new(marker: &str) -> Result<Self, VigilError> {
        Ok(InlinePresentation {
            marker: marker.to_string(),
            style_block: compile(r"(?is)<style\b[^>]*>(.*?)</style>")?,
            style_attr: compile_ci(r#"\bstyle\s*=\s*["']([^"']+)["']"#)?,
            script_block: compile(r"(?is)<script\b([^>]*)>(.*?)</script>")?,
            script_src: compile_ci(r"\bsrc\s*=")?,
            template_binding: compile(&format!(
                r"^\s*(?:var|let|const)\s+\w+\s*=\s*{}",
                regex::escape(marker)
            ))?,
            event_handler: compile_ci(r#"(?:^|[\s/])(?P<attr>on\w+)\s*=\s*["']([^"']+)["']"#)?,
        })
    }

    fn style_blocks(&self, path: &str, content: &str, out: &mut Vec<Violation>) {
        for caps in self.style_block.captures_iter(content) {
            let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if body.as_str().trim().is_empty() {
                continue;
            }
            out.push(violation(
                self,
                path,
                line_of(content, whole.start()),
                "inline_css",
                "Inline CSS found in <style> tag".to_string(),
                "Move CSS to a separate .css file and reference it with a <link> tag".to_string(),
            ));
        }
    }

    fn style_attributes(&self, path: &str, content: &str, out: &mut Vec<Violation>) {
        for caps in self.style_attr.captures_iter(content) {
            let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if value.as_str().contains(self.marker.as_str()) {
                continue;
            }
            out.push(violation(
                self,
                path,
                line_of(content, whole.start()),
                "inline_style_attribute",
                format!("Inline style attribute found: style=\"{}\"", value.as_str()),
                "Use CSS classes instead of inline styles".to_string(),
            ));
        }
    }

    fn script_blocks(&self, path: &str, content: &str, out: &mut Vec<Violation>) {
        for caps in self.script_block.captures_iter(content) {
            let (Some(whole), Some(attrs), Some(body)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            if self.script_src.is_match(attrs.as_str()) || body.as_str().trim().is_empty() {
                continue;
            }
            if self.template_binding.is_match(body.as_str()) {
                continue;
            }
            out.push(violation(
                self,
                path,
                line_of(content, whole.start()),
                "inline_javascript",
                "Inline JavaScript found in <script> tag".to_string(),
                "Move JavaScript to a separate .js file and reference it with <script src=\"\">"
                    .to_string(),
            ));
        }
    }

    fn event_handlers(&self, path: &str, content: &str, out: &mut Vec<Violation>) {
        for caps in self.event_handler.captures_iter(content) {
            let Some(attr) = caps.name("attr") else {
                continue;
            };
            out.push(violation(
                self,
                path,
                line_of(content, attr.start()),
                "inline_event_handler",
                format!("Inline event handler found: {}", attr.as_str()),
                "Use addEventListener in a separate JavaScript file or a framework event binding"
                    .to_string(),
            ));
        }
    }
}

impl Rule for InlinePresentation {
    fn id(&self) -> &'static str {
        "no-inline-presentation-code"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Only(&[FileClass::Markup])
    }

    fn description(&self) -> &'static str {
        "No inline styles, scripts, or event handlers in templates"
    }

    fn evaluate(&self, path: &str, content: &str) -> Vec<Violation> {
        let mut out = Vec::new();
        self.style_blocks(path, content, &mut out);
        self.style_attributes(path, content, &mut out);
        self.script_blocks(path, content, &mut out);
        self.event_handlers(path, content, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> InlinePresentation {
        InlinePresentation::new("@").unwrap()
    }

    fn types(found: &[Violation]) -> Vec<(&str, usize)> {
        found
            .iter()
            .map(|v| (v.violation_type.as_str(), v.line_number))
            .collect()
    }

    #[test]
    fn test_style_blocks_require_content() {
        let src = "<style>\n  \n</style>\n<STYLE type=\"text/css\">\n.a { color: red; }\n</STYLE>\n";
        let found = rule().evaluate("Index.cshtml", src);
        assert_eq!(types(&found), vec![("inline_css", 4)]);
    }

    #[test]
    fn test_style_attribute_skips_template_expressions() {
        let src = "<div style=\"width: 10px\"></div>\n<div style=\"width: @Model.W\"></div>\n";
        let found = rule().evaluate("Index.cshtml", src);
        assert_eq!(types(&found), vec![("inline_style_attribute", 1)]);
        assert_eq!(found[0].message, "Inline style attribute found: style=\"width: 10px\"");
    }

    #[test]
    fn test_script_blocks_external_empty_and_template_binding() {
        let src = "<script src=\"/js/site.js\"></script>\n\
                   <script></script>\n\
                   <script>var userId = @Model.Id;</script>\n\
                   <script type=\"module\">\n  init();\n</script>\n";
        let found = rule().evaluate("Layout.cshtml", src);
        assert_eq!(types(&found), vec![("inline_javascript", 4)]);
    }

    #[test]
    fn test_event_handlers_named_in_message_and_data_attributes_ignored() {
        let src = "<button onclick=\"go()\">Go</button>\n<input ONCHANGE='x()' />\n<span data-online=\"yes\"></span>\n";
        let found = rule().evaluate("Form.cshtml", src);
        let messages: Vec<_> = found.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Inline event handler found: onclick",
                "Inline event handler found: ONCHANGE",
            ]
        );
    }

    #[test]
    fn test_check_order_within_file() {
        let src = "<a onclick=\"x()\" style=\"color:red\">x</a>\n<style>p{}</style>\n";
        let found = rule().evaluate("A.cshtml", src);
        assert_eq!(
            types(&found),
            vec![
                ("inline_css", 2),
                ("inline_style_attribute", 1),
                ("inline_event_handler", 1),
            ]
        );
    }
}
