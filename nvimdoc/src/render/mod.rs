//! Renderer module: trait-based format dispatch.

pub mod markdown;
pub mod text;
pub mod vimdoc;

use crate::model::*;
use crate::registry::Registry;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::HashSet;

/// Layout constants shared by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Maximum width of wrapped vimdoc text
    pub wrap_width: usize,
    /// Left margin of vimdoc description blocks
    pub indent: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            wrap_width: 80,
            indent: 4,
        }
    }
}

/// Trait for rendering a list of functions into a specific output format.
pub trait Renderer {
    fn render(&self, functions: &[&FunctionDoc], registry: &Registry) -> Vec<String>;
    fn format_name(&self) -> &str;
}

/// Create a renderer for the given format name. `module` prefixes vimdoc tags.
pub fn create_renderer(format: &str, module: &str, config: RenderConfig) -> Result<Box<dyn Renderer>> {
    match format {
        "markdown" | "md" => Ok(Box::new(markdown::MarkdownRenderer)),
        "vimdoc" | "vim" | "help" => Ok(Box::new(vimdoc::VimdocRenderer::new(module, config))),
        _ => Err(anyhow!(
            "unknown format: {}. Use markdown or vimdoc",
            format
        )),
    }
}

/// Render functions as Markdown lines.
pub fn render_markdown(functions: &[&FunctionDoc], registry: &Registry) -> Vec<String> {
    markdown::MarkdownRenderer.render(functions, registry)
}

/// Render functions as vimdoc lines with default layout.
pub fn render_vimdoc(module: &str, functions: &[&FunctionDoc], registry: &Registry) -> Vec<String> {
    vimdoc::VimdocRenderer::new(module, RenderConfig::default()).render(functions, registry)
}

/// Declared types reachable from the functions' signatures, in order of
/// first reference. Types mentioned by those types' fields follow.
pub fn referenced_types<'a>(functions: &[&FunctionDoc], registry: &'a Registry) -> Vec<&'a TypeDoc> {
    let mut seen = HashSet::new();
    let mut found: Vec<&'a TypeDoc> = Vec::new();
    let mut visit = |ty: &TypeRef, found: &mut Vec<&'a TypeDoc>| {
        ty.walk(&mut |t| {
            if let TypeRef::Custom(name) = t {
                if seen.insert(name.clone()) {
                    found.extend(registry.lookup_type(name));
                }
            }
        });
    };

    for func in functions {
        for ty in func.type_refs() {
            visit(ty, &mut found);
        }
    }
    let mut next = 0;
    while next < found.len() {
        let doc = found[next];
        for ty in doc.type_refs() {
            visit(ty, &mut found);
        }
        next += 1;
    }
    found
}

/// `name(a, b?)` with optional parameters marked.
pub fn call_signature(func: &FunctionDoc, mark: impl Fn(&Param) -> String) -> String {
    let params: Vec<String> = func.params.iter().map(mark).collect();
    format!("{}({})", func.name, params.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
---@class demo.Inner
---@field n integer

---@class demo.Opts
---@field inner demo.Inner

---@alias demo.Mode \"a\"|\"b\"

---@param opts demo.Opts
---@param mode? demo.Mode
---@param other Unknown
function M.run(opts, mode, other) end
";

    #[test]
    fn referenced_types_follow_first_use() {
        let registry = Registry::from_sources([("demo/init.lua", SOURCE)]);
        let funcs = registry.public_functions("demo/init.lua");
        let names: Vec<&str> = referenced_types(&funcs, &registry)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["demo.Opts", "demo.Mode", "demo.Inner"]);
    }

    #[test]
    fn unknown_format_is_an_error() {
        let err = create_renderer("html", "demo", RenderConfig::default()).err().unwrap();
        assert!(err.to_string().contains("unknown format"));
        let renderer = create_renderer("md", "demo", RenderConfig::default()).unwrap();
        assert_eq!(renderer.format_name(), "markdown");
        let renderer = create_renderer("help", "demo", RenderConfig::default()).unwrap();
        assert_eq!(renderer.format_name(), "vimdoc");
    }
}
