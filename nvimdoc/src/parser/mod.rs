//! Parser module: per-file scan and dispatch by file extension.

pub mod declaration;
pub mod tokenizer;
pub mod types;

use crate::diagnostic::Diagnostic;
use crate::model::FileDocs;
use anyhow::{anyhow, Result};
use declaration::{parse_declaration, parse_signature, signature_text, Declaration};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use tokenizer::{collect_block, is_doc_comment};

static RE_RETURN_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^return[[:blank:]]*\{[[:blank:]]*$").unwrap());

/// Declarations and diagnostics from one source file.
#[derive(Debug, Default)]
pub struct ParsedFile {
    pub docs: FileDocs,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a source file based on its extension.
pub fn parse_file(path: &Path, label: &str, content: &str) -> Result<ParsedFile> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("lua") => Ok(parse_source(label, content)),
        _ => Err(anyhow!("unsupported file type: {}", path.display())),
    }
}

/// Parse Lua source text. `file` is the label recorded in source locations.
///
/// A declaration point is every line that ends a doc block, plus every
/// undocumented function declaration. An indented `key = function` only
/// counts when it is a key of the table the module returns; otherwise it is
/// a callback inside some other expression.
pub fn parse_source(file: &str, content: &str) -> ParsedFile {
    let lines: Vec<&str> = content.lines().collect();
    let returned_keys = returned_table_keys(&lines);
    let mut parsed = ParsedFile::default();

    for idx in 0..=lines.len() {
        let line = lines.get(idx).copied();
        if line.is_some_and(is_doc_comment) {
            continue;
        }

        let header = line.map(|_| signature_text(&lines, idx));
        let follows_block = idx > 0 && is_doc_comment(lines[idx - 1]);
        let declares = header
            .as_deref()
            .and_then(parse_signature)
            .is_some_and(|sig| !sig.table_key || returned_keys.contains(&idx));
        if !follows_block && !declares {
            continue;
        }

        let block = collect_block(&lines, idx);
        for decl in parse_declaration(&block, header.as_deref(), file, idx, &mut parsed.diagnostics) {
            match decl {
                Declaration::Function(func) => parsed.docs.functions.push(func),
                Declaration::Type(ty) => parsed.docs.types.push(ty),
            }
        }
    }

    parsed
}

/// Line indexes of the direct keys of a top-level `return { ... }` table.
fn returned_table_keys(lines: &[&str]) -> HashSet<usize> {
    let mut keys = HashSet::new();
    let Some(start) = lines.iter().rposition(|l| RE_RETURN_TABLE.is_match(l)) else {
        return keys;
    };

    let mut key_indent = None;
    for (idx, line) in lines.iter().enumerate().skip(start + 1) {
        if line.starts_with('}') {
            break;
        }
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        let indent = line.len() - trimmed.len();
        if *key_indent.get_or_insert(indent) == indent {
            keys.insert(idx);
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Visibility;

    const SOURCE: &str = r#"local M = {}

---@class demo.Opts
---@field verbose? boolean

---Setup the plugin
---@param opts? demo.Opts
M.setup = function(opts)
end

local function helper(x)
  return x
end

---@alias demo.Level "low"|"high"
"#;

    #[test]
    fn finds_functions_and_types() {
        let parsed = parse_source("demo/init.lua", SOURCE);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

        let names: Vec<&str> = parsed.docs.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["setup", "helper"]);
        assert_eq!(parsed.docs.functions[0].location.line, 8);

        let types: Vec<&str> = parsed.docs.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(types, vec!["demo.Opts", "demo.Level"]);
    }

    #[test]
    fn nested_callbacks_are_not_declarations() {
        let src = r#"local M = {}

---Start watching
M.setup = function()
  vim.api.nvim_create_autocmd("VimLeavePre", {
    callback = function()
      M.save()
    end,
  })
end

return M
"#;
        let parsed = parse_source("demo/init.lua", src);
        let names: Vec<&str> = parsed.docs.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["setup"]);
    }

    #[test]
    fn returned_table_keys_are_declarations() {
        let src = r#"return {
  ---Open the picker
  open = function(opts)
    vim.schedule(function() end)
  end,
  close = function()
    local handlers = {
      on_exit = function() end,
    }
  end,
}
"#;
        let parsed = parse_source("demo/picker.lua", src);
        let found: Vec<(&str, Visibility)> = parsed
            .docs
            .functions
            .iter()
            .map(|f| (f.name.as_str(), f.visibility))
            .collect();
        assert_eq!(
            found,
            vec![("open", Visibility::Public), ("close", Visibility::Local)]
        );
    }

    #[test]
    fn parameter_list_spanning_lines() {
        let src = r#"local M = {}

---Load a session
---@param name string
---@param opts? table
function M.load(
  name, -- session name
  opts
)
end
"#;
        let parsed = parse_source("demo/init.lua", src);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        assert_eq!(parsed.docs.functions.len(), 1);
        let func = &parsed.docs.functions[0];
        assert_eq!(func.name, "load");
        assert_eq!(func.location.line, 6);
        let params: Vec<&str> = func.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(params, vec!["name", "opts"]);
    }

    #[test]
    fn rejects_other_extensions() {
        let err = parse_file(Path::new("x.vim"), "x.vim", "").unwrap_err();
        assert!(err.to_string().contains("unsupported file type"));
    }
}
