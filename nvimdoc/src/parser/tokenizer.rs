//! Comment tokenizer: isolates the `---` block above a declaration.
//!
//! Lines are classified as tags (`---@param ...`), enum variants
//! (`---| "value"`) or prose. Scanning is backward from the declaration and
//! stops at the first line that is not a `---` doc comment.

use regex::Regex;
use std::sync::LazyLock;

static RE_DOC_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:blank:]]*---(.*)$").unwrap());

static RE_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:blank:]]*-{4,}[[:blank:]]*$").unwrap());

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:blank:]]*@([A-Za-z_]+)(.*)$").unwrap());

static RE_VARIANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:blank:]]*\|[[:blank:]]*(.*)$").unwrap());

/// Tag directives with meaning to the declaration parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Param,
    Return,
    Field,
    Class,
    Alias,
    Generic,
    Private,
    Deprecated,
    Note,
    Other(String),
}

impl Directive {
    fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "param" => Self::Param,
            "return" => Self::Return,
            "field" => Self::Field,
            "class" => Self::Class,
            "alias" => Self::Alias,
            "generic" => Self::Generic,
            "private" => Self::Private,
            "deprecated" => Self::Deprecated,
            "note" => Self::Note,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn keyword(&self) -> &str {
        match self {
            Self::Param => "param",
            Self::Return => "return",
            Self::Field => "field",
            Self::Class => "class",
            Self::Alias => "alias",
            Self::Generic => "generic",
            Self::Private => "private",
            Self::Deprecated => "deprecated",
            Self::Note => "note",
            Self::Other(keyword) => keyword,
        }
    }
}

/// What a single doc-comment line carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Tag { directive: Directive, body: String },
    Variant(String),
    Prose(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocLine {
    pub kind: LineKind,
    /// 1-based source line
    pub line: usize,
}

/// Contiguous doc-comment lines attached to one declaration, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlock {
    pub lines: Vec<DocLine>,
}

impl DocBlock {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn has_tag(&self, directive: &Directive) -> bool {
        self.lines
            .iter()
            .any(|l| matches!(&l.kind, LineKind::Tag { directive: d, .. } if d == directive))
    }
}

/// Text after the `---` prefix, or `None` if the line is not a doc comment.
pub fn doc_comment_text(line: &str) -> Option<&str> {
    if RE_RULE.is_match(line) {
        return None;
    }
    RE_DOC_COMMENT
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn is_doc_comment(line: &str) -> bool {
    doc_comment_text(line).is_some()
}

/// Classify one doc-comment line.
pub fn classify(text: &str) -> LineKind {
    if let Some(caps) = RE_TAG.captures(text) {
        return LineKind::Tag {
            directive: Directive::from_keyword(&caps[1]),
            body: caps[2].trim().to_string(),
        };
    }
    if let Some(caps) = RE_VARIANT.captures(text) {
        return LineKind::Variant(caps[1].trim().to_string());
    }
    // Drop the single separating space only; deeper indentation is content.
    let prose = text.strip_prefix(' ').unwrap_or(text);
    LineKind::Prose(prose.trim_end().to_string())
}

/// Collect the doc block immediately above `decl` (a 0-based index; may be
/// `lines.len()` for a block at end of file).
pub fn collect_block(lines: &[&str], decl: usize) -> DocBlock {
    let mut start = decl.min(lines.len());
    while start > 0 && is_doc_comment(lines[start - 1]) {
        start -= 1;
    }

    let lines = lines[start..decl.min(lines.len())]
        .iter()
        .enumerate()
        .filter_map(|(offset, line)| {
            doc_comment_text(line).map(|text| DocLine {
                kind: classify(text),
                line: start + offset + 1,
            })
        })
        .collect();

    DocBlock { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tag(directive: Directive, body: &str) -> LineKind {
        LineKind::Tag {
            directive,
            body: body.to_string(),
        }
    }

    #[test]
    fn classifies_lines() {
        assert_eq!(classify("@param name string"), tag(Directive::Param, "name string"));
        assert_eq!(classify(" @return boolean"), tag(Directive::Return, "boolean"));
        assert_eq!(classify("@diagnostic disable"), tag(Directive::Other("diagnostic".into()), "disable"));
        assert_eq!(classify("| \"a\" # first"), LineKind::Variant("\"a\" # first".to_string()));
        assert_eq!(classify(" Load a session"), LineKind::Prose("Load a session".to_string()));
        assert_eq!(classify(""), LineKind::Prose(String::new()));
    }

    #[test]
    fn plain_comments_are_not_doc_comments() {
        assert!(is_doc_comment("---@param a string"));
        assert!(is_doc_comment("  --- indented"));
        assert!(!is_doc_comment("-- plain comment"));
        assert!(!is_doc_comment("----------"));
        assert!(!is_doc_comment("local x = 1"));
    }

    #[test]
    fn collects_contiguous_block_in_order() {
        let src = [
            "local M = {}",
            "",
            "---Adds two numbers",
            "---@param a number",
            "---@param b number",
            "M.add = function(a, b)",
        ];
        let block = collect_block(&src, 5);
        assert_eq!(block.lines.len(), 3);
        assert_eq!(block.lines[0].line, 3);
        assert_eq!(block.lines[0].kind, LineKind::Prose("Adds two numbers".to_string()));
        assert_eq!(block.lines[2].kind, tag(Directive::Param, "b number"));
    }

    #[test]
    fn stops_at_blank_and_plain_comments() {
        let src = ["---detached", "", "-- plain", "---attached", "function f() end"];
        let block = collect_block(&src, 4);
        assert_eq!(block.lines.len(), 1);
        assert_eq!(block.lines[0].kind, LineKind::Prose("attached".to_string()));
    }

    #[test]
    fn no_preceding_comments_is_empty() {
        let src = ["local x = 1", "function f() end"];
        assert!(collect_block(&src, 1).is_empty());
        assert!(collect_block(&src, 0).is_empty());
    }

    #[test]
    fn block_at_end_of_file() {
        let src = ["---@class Foo", "---@field a string"];
        let block = collect_block(&src, src.len());
        assert_eq!(block.lines.len(), 2);
        assert!(block.has_tag(&Directive::Class));
    }
}
