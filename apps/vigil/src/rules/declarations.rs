//! Rules over publicly visible type declarations in declaration-bearing
//! source files.
//!
//! - `single-declaration-per-file`: more than one public type in a file
//!   flags every one of them.
//! - `doc-comment-required`: a public type needs `///` or `/**` within the
//!   five lines above it.
//!
//! Matching is textual. A declaration is `public`, optional modifiers, then
//! `class`, `record`, `struct`, `interface`, or `enum` and a name; attribute
//! lists on the same line are skipped. Indentation is not inspected.
//! A light brace scan (ignoring comments and string/char literals) marks a
//! declaration top-level when every enclosing block is a `namespace`; only
//! top-level types count toward the one-per-file limit. Matches that sit
//! inside a comment or literal are dropped.

use super::{compile, line_of, violation, Rule, RuleScope};
use crate::error::VigilError;
use crate::models::policy::FileClass;
use crate::models::{Severity, Violation};
use regex::Regex;
use std::path::Path;

const DECLARATION_PATTERN: &str = r"(?m)^[ \t]*(?:\[[^\]\r\n]*\][ \t]*)*(?P<decl>public[ \t]+(?:(?:static|sealed|abstract|partial|readonly|ref|unsafe|new)[ \t]+)*(?P<kind>record(?:[ \t]+(?:class|struct))?|class|struct|interface|enum)[ \t]+(?P<name>\w+))";

const DOC_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: String,
    /// Byte offset of the `public` keyword.
    pub offset: usize,
    /// Not nested inside another type (namespaces do not count).
    pub top_level: bool,
}

#[derive(Clone)]
pub struct DeclarationMatcher {
    re: Regex,
}

impl DeclarationMatcher {
    pub fn new() -> Result<Self, VigilError> {
        Ok(DeclarationMatcher {
            re: compile(DECLARATION_PATTERN)?,
        })
    }

    /// Public type declarations in source order.
    pub fn find(&self, content: &str) -> Vec<Declaration> {
        let mut found: Vec<Declaration> = self
            .re
            .captures_iter(content)
            .filter_map(|caps| {
                let decl = caps.name("decl")?;
                Some(Declaration {
                    name: caps.name("name")?.as_str().to_string(),
                    kind: caps
                        .name("kind")?
                        .as_str()
                        .split_whitespace()
                        .next()
                        .unwrap_or("class")
                        .to_string(),
                    offset: decl.start(),
                    top_level: false,
                })
            })
            .collect();
        let offsets: Vec<usize> = found.iter().map(|d| d.offset).collect();
        let placement = placement_at(content, &offsets);
        let mut kept = Vec::with_capacity(found.len());
        for (mut d, place) in found.drain(..).zip(placement) {
            match place {
                Placement::InLiteral => continue,
                Placement::Code { top_level } => {
                    d.top_level = top_level;
                    kept.push(d);
                }
            }
        }
        kept
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Inside a comment or a string/char literal.
    InLiteral,
    /// In code; `top_level` when all enclosing blocks are namespaces.
    Code { top_level: bool },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lex {
    Code,
    LineComment,
    BlockComment,
    Str,
    Verbatim,
    Char,
}

/// Classify each of the ascending `offsets` by lexical context and nesting.
fn placement_at(content: &str, offsets: &[usize]) -> Vec<Placement> {
    let bytes = content.as_bytes();
    let mut out = Vec::with_capacity(offsets.len());
    let mut next = offsets.iter().peekable();
    // one entry per open block: true when the block is a namespace body
    let mut blocks: Vec<bool> = Vec::new();
    let mut header_start = 0usize;
    let mut lex = Lex::Code;
    let mut i = 0usize;
    while i <= bytes.len() {
        while let Some(&&off) = next.peek() {
            if off > i {
                break;
            }
            out.push(if lex == Lex::Code {
                Placement::Code {
                    top_level: blocks.iter().all(|ns| *ns),
                }
            } else {
                Placement::InLiteral
            });
            next.next();
        }
        if i == bytes.len() {
            break;
        }
        let b = bytes[i];
        let peek = bytes.get(i + 1).copied();
        match lex {
            Lex::Code => match b {
                b'/' if peek == Some(b'/') => {
                    lex = Lex::LineComment;
                    i += 1;
                }
                b'/' if peek == Some(b'*') => {
                    lex = Lex::BlockComment;
                    i += 1;
                }
                b'"' => {
                    let verbatim = i > 0
                        && (bytes[i - 1] == b'@'
                            || (bytes[i - 1] == b'$' && i > 1 && bytes[i - 2] == b'@'));
                    lex = if verbatim { Lex::Verbatim } else { Lex::Str };
                }
                b'\'' => lex = Lex::Char,
                b'{' => {
                    blocks.push(is_namespace_header(&content[header_start..i]));
                    header_start = i + 1;
                }
                b'}' => {
                    blocks.pop();
                    header_start = i + 1;
                }
                b';' => header_start = i + 1,
                _ => {}
            },
            Lex::LineComment => {
                if b == b'\n' {
                    lex = Lex::Code;
                }
            }
            Lex::BlockComment => {
                if b == b'*' && peek == Some(b'/') {
                    lex = Lex::Code;
                    i += 1;
                }
            }
            Lex::Str | Lex::Char => {
                let close = if lex == Lex::Str { b'"' } else { b'\'' };
                if b == b'\\' {
                    i += 1;
                } else if b == close || b == b'\n' {
                    lex = Lex::Code;
                }
            }
            Lex::Verbatim => {
                if b == b'"' {
                    if peek == Some(b'"') {
                        i += 1;
                    } else {
                        lex = Lex::Code;
                    }
                }
            }
        }
        i += 1;
    }
    // offsets past the end (not produced by the matcher) count as code
    while next.next().is_some() {
        out.push(Placement::Code { top_level: true });
    }
    out
}

/// True when the text before a `{` declares a namespace.
fn is_namespace_header(header: &str) -> bool {
    header
        .lines()
        .map(str::trim)
        .find(|l| {
            !l.is_empty()
                && !l.starts_with("//")
                && !l.starts_with("/*")
                && !l.starts_with('*')
                && !l.starts_with('[')
        })
        .map(|l| l == "namespace" || l.starts_with("namespace "))
        .unwrap_or(false)
}

pub struct SingleDeclaration {
    matcher: DeclarationMatcher,
}

impl SingleDeclaration {
    pub fn new(matcher: DeclarationMatcher) -> Self {
        SingleDeclaration { matcher }
    }
}

impl Rule for SingleDeclaration {
    fn id(&self) -> &'static str {
        "single-declaration-per-file"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Only(&[FileClass::Declaration])
    }

    fn description(&self) -> &'static str {
        "At most one public type declaration per file"
    }

    fn evaluate(&self, path: &str, content: &str) -> Vec<Violation> {
        let decls: Vec<Declaration> = self
            .matcher
            .find(content)
            .into_iter()
            .filter(|d| d.top_level)
            .collect();
        if decls.len() < 2 {
            return Vec::new();
        }
        let names = decls
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("cs");
        decls
            .iter()
            .map(|d| {
                violation(
                    self,
                    path,
                    line_of(content, d.offset),
                    "multiple_classes_per_file",
                    format!("Multiple public types found in file: {}", names),
                    format!(
                        "Move {} \"{}\" to its own file: {}.{}",
                        d.kind, d.name, d.name, ext
                    ),
                )
            })
            .collect()
    }
}

pub struct DocCommentRequired {
    matcher: DeclarationMatcher,
}

impl DocCommentRequired {
    pub fn new(matcher: DeclarationMatcher) -> Self {
        DocCommentRequired { matcher }
    }
}

impl Rule for DocCommentRequired {
    fn id(&self) -> &'static str {
        "doc-comment-required"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Only(&[FileClass::Declaration])
    }

    fn description(&self) -> &'static str {
        "Public types carry a documentation comment"
    }

    fn evaluate(&self, path: &str, content: &str) -> Vec<Violation> {
        self.matcher
            .find(content)
            .into_iter()
            .filter(|d| !has_doc_comment(content, d.offset))
            .map(|d| {
                violation(
                    self,
                    path,
                    line_of(content, d.offset),
                    "missing_xml_documentation",
                    format!("Public {} \"{}\" missing XML documentation", d.kind, d.name),
                    format!(
                        "Add /// <summary> documentation above {} \"{}\"",
                        d.kind, d.name
                    ),
                )
            })
            .collect()
    }
}

/// True when one of the `DOC_WINDOW` lines above `offset`'s line holds a
/// doc-comment marker.
fn has_doc_comment(content: &str, offset: usize) -> bool {
    let line_start = content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    content[..line_start]
        .lines()
        .rev()
        .take(DOC_WINDOW)
        .any(|l| l.contains("///") || l.contains("/**"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> DeclarationMatcher {
        DeclarationMatcher::new().unwrap()
    }

    #[test]
    fn test_find_handles_modifiers_attributes_and_records() {
        let src = "namespace N;\n\
                   [Serializable] public sealed partial class A<T> { }\n\
                   public static class B { }\n\
                   public record struct C(int X);\n\
                   internal class Hidden { }\n\
                   public interface ID { }\n\
                   public enum E { X }\n";
        let names: Vec<_> = matcher().find(src).into_iter().map(|d| (d.kind, d.name)).collect();
        assert_eq!(
            names,
            vec![
                ("class".to_string(), "A".to_string()),
                ("class".to_string(), "B".to_string()),
                ("record".to_string(), "C".to_string()),
                ("interface".to_string(), "ID".to_string()),
                ("enum".to_string(), "E".to_string()),
            ]
        );
    }

    #[test]
    fn test_single_declaration_flags_each_of_k() {
        let src = "using X;\n\npublic class First { }\n\n/// doc\npublic class Second { }\n    public class Third { }\n";
        let rule = SingleDeclaration::new(matcher());
        let found = rule.evaluate("Models/First.cs", src);
        assert_eq!(found.len(), 3);
        let lines: Vec<_> = found.iter().map(|v| v.line_number).collect();
        assert_eq!(lines, vec![3, 6, 7]);
        assert!(found.iter().all(|v| v.severity == Severity::Error));
        assert!(found[0].message.contains("First, Second, Third"));
        assert_eq!(found[1].suggestion, "Move class \"Second\" to its own file: Second.cs");
    }

    #[test]
    fn test_single_declaration_allows_one() {
        let rule = SingleDeclaration::new(matcher());
        assert!(rule
            .evaluate("A.cs", "public class A { private class Inner { } }\n")
            .is_empty());
    }

    #[test]
    fn test_nested_public_type_in_block_namespace_is_not_counted() {
        let src = "namespace N {\n\
                   /// Outer\n\
                   public class Outer {\n\
                   /// Inner\n\
                   public class Inner { }\n\
                   }\n\
                   }\n";
        let decls = matcher().find(src);
        let flags: Vec<_> = decls.iter().map(|d| (d.name.as_str(), d.top_level)).collect();
        assert_eq!(flags, vec![("Outer", true), ("Inner", false)]);
        assert!(SingleDeclaration::new(matcher()).evaluate("Outer.cs", src).is_empty());
    }

    #[test]
    fn test_top_level_types_in_nested_namespaces_still_count() {
        let src = "namespace A {\n namespace B {\n  public class X { }\n  public class Y { }\n }\n}\n";
        let found = SingleDeclaration::new(matcher()).evaluate("X.cs", src);
        let lines: Vec<_> = found.iter().map(|v| v.line_number).collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn test_braces_in_literals_and_comments_are_ignored() {
        let src = "public class A {\n\
                   string s = \"{ not a block\";\n\
                   string v = @\"say \"\"}\"\" \";\n\
                   char c = '{';\n\
                   // stray }\n\
                   /* } } */\n\
                   }\n\
                   public class B { }\n";
        let decls = matcher().find(src);
        assert!(decls.iter().all(|d| d.top_level));
        assert_eq!(SingleDeclaration::new(matcher()).evaluate("A.cs", src).len(), 2);
    }

    #[test]
    fn test_declaration_inside_block_comment_is_dropped() {
        let src = "/*\npublic class Old { }\n*/\npublic class New { }\n";
        let names: Vec<_> = matcher().find(src).into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["New"]);
    }

    #[test]
    fn test_doc_comment_window_is_five_lines() {
        let rule = DocCommentRequired::new(matcher());
        let near = "/// <summary>x</summary>\n[A]\n[B]\n[C]\n[D]\npublic class Near { }\n";
        assert!(rule.evaluate("Near.cs", near).is_empty());

        let far = "/// <summary>x</summary>\n[A]\n[B]\n[C]\n[D]\n[E]\npublic class Far { }\n";
        let found = rule.evaluate("Far.cs", far);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line_number, 7);
        assert_eq!(found[0].severity, Severity::Warning);
        assert_eq!(found[0].violation_type, "missing_xml_documentation");
    }

    #[test]
    fn test_doc_comment_does_not_count_same_line_or_below() {
        let rule = DocCommentRequired::new(matcher());
        let src = "public class A { } /// trailing\n/// below\n";
        assert_eq!(rule.evaluate("A.cs", src).len(), 1);
    }

    #[test]
    fn test_block_doc_comment_accepted() {
        let rule = DocCommentRequired::new(matcher());
        let src = "/**\n * Widget.\n */\npublic struct Widget { }\n";
        assert!(rule.evaluate("Widget.cs", src).is_empty());
    }
}
