//! Vim help-file renderer.
//!
//! Every function gets a signature line with its `*module.name*` tag
//! right-aligned to the wrap width, followed by an indented block of
//! description, parameters, returns and notes. Text is escaped so that no
//! `*` or `|` in names or prose turns into a tag or link.

use crate::model::*;
use crate::registry::Registry;
use crate::render::text::{escape_tag, escape_text, leftright, wrap, wrap_paragraphs};
use crate::render::{call_signature, referenced_types, RenderConfig, Renderer};

pub struct VimdocRenderer {
    module: String,
    config: RenderConfig,
}

impl VimdocRenderer {
    pub fn new(module: &str, config: RenderConfig) -> Self {
        Self {
            module: module.to_string(),
            config,
        }
    }

    fn margin(&self, extra: usize) -> String {
        " ".repeat(self.config.indent + extra)
    }

    fn render_function(&self, func: &FunctionDoc) -> Vec<String> {
        let width = self.config.wrap_width;
        let mut lines = Vec::new();

        let signature = call_signature(func, |p| format!("{{{}}}", escape_tag(&p.name)));
        let tag = format!("*{}*", escape_tag(&format!("{}.{}", self.module, func.name)));
        lines.extend(leftright(&escape_text(&signature), &tag, width));

        let margin = self.margin(0);
        if let Some(ref reason) = func.deprecated {
            let text = if reason.is_empty() {
                "Deprecated".to_string()
            } else {
                format!("Deprecated: {}", reason)
            };
            lines.extend(wrap(&escape_text(&text), width, &margin, &margin));
        }
        if !func.description.is_empty() {
            lines.extend(wrap_paragraphs(&escape_text(&func.description), width, &margin));
        }

        if !func.params.is_empty() {
            lines.push(String::new());
            lines.push(format!("{}Parameters:", margin));
            for param in &func.params {
                let entry = format!(
                    "{{{}}} `{}`",
                    escape_tag(&param.name),
                    escape_text(&param.ty.to_string())
                );
                lines.extend(self.entry(&entry, param.description.as_deref()));
            }
        }

        if !func.returns.is_empty() {
            lines.push(String::new());
            lines.push(format!("{}Returns:", margin));
            for ret in &func.returns {
                let entry = format!("`{}`", escape_text(&ret.ty.to_string()));
                lines.extend(self.entry(&entry, ret.description.as_deref()));
            }
        }

        if let Some(ref note) = func.note {
            lines.push(String::new());
            lines.push(format!("{}Note:", margin));
            lines.push(format!("{}<pre>", self.margin(2)));
            for line in note.lines() {
                lines.push(format!("{}{}", self.margin(2), escape_text(line)).trim_end().to_string());
            }
            lines.push(format!("{}</pre>", self.margin(2)));
        }

        lines
    }

    fn render_type(&self, ty: &TypeDoc) -> Vec<String> {
        let width = self.config.wrap_width;
        let margin = self.margin(0);
        let mut lines = Vec::new();

        let tag = format!("*{}*", escape_tag(&ty.name));
        lines.extend(leftright(&escape_text(&ty.name), &tag, width));
        lines.extend(wrap(
            &format!("({})", ty.kind.label()),
            width,
            &margin,
            &margin,
        ));
        if !ty.description.is_empty() {
            lines.extend(wrap_paragraphs(&escape_text(&ty.description), width, &margin));
        }

        match &ty.kind {
            TypeKind::Record { parents, fields } => {
                if !parents.is_empty() {
                    let parents: Vec<String> = parents
                        .iter()
                        .map(|p| format!("`{}`", escape_text(&p.to_string())))
                        .collect();
                    lines.extend(wrap(
                        &format!("Extends: {}", parents.join(", ")),
                        width,
                        &margin,
                        &margin,
                    ));
                }
                if !fields.is_empty() {
                    lines.push(String::new());
                    lines.push(format!("{}Fields:", margin));
                    for field in fields {
                        let name = if field.optional && !field.ty.is_optional() {
                            format!("{}?", field.name)
                        } else {
                            field.name.clone()
                        };
                        let entry = format!(
                            "{{{}}} `{}`",
                            escape_tag(&name),
                            escape_text(&field.ty.to_string())
                        );
                        lines.extend(self.entry(&entry, field.description.as_deref()));
                    }
                }
            }
            TypeKind::Enum(variants) => {
                lines.push(String::new());
                lines.push(format!("{}Values:", margin));
                for variant in variants {
                    let entry = format!("`{}`", escape_text(&variant.value));
                    lines.extend(self.entry(&entry, variant.description.as_deref()));
                }
            }
            TypeKind::Alias(aliased) => {
                lines.extend(wrap(
                    &format!("Type: `{}`", escape_text(&aliased.to_string())),
                    width,
                    &margin,
                    &margin,
                ));
            }
        }

        lines
    }

    /// One list entry with a hanging indent for its description.
    fn entry(&self, head: &str, description: Option<&str>) -> Vec<String> {
        let text = match description {
            Some(desc) => format!("{} {}", head, escape_text(desc)),
            None => head.to_string(),
        };
        wrap(&text, self.config.wrap_width, &self.margin(2), &self.margin(6))
    }
}

impl Renderer for VimdocRenderer {
    fn render(&self, functions: &[&FunctionDoc], registry: &Registry) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        for func in functions {
            lines.extend(self.render_function(func));
            lines.push(String::new());
        }

        let types = referenced_types(functions, registry);
        if !types.is_empty() {
            lines.push("Types:".to_string());
            lines.push(String::new());
            for ty in types {
                lines.extend(self.render_type(ty));
                lines.push(String::new());
            }
        }

        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        lines
    }

    fn format_name(&self) -> &str {
        "vimdoc"
    }
}

/// One titled section of a help file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VimdocSection {
    pub name: String,
    pub tag: String,
    pub body: Vec<String>,
}

impl VimdocSection {
    pub fn new(name: impl Into<String>, tag: impl Into<String>, body: Vec<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            body,
        }
    }
}

/// A complete help file: header, table of contents and sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VimdocDocument {
    pub filename: String,
    pub project: String,
    pub sections: Vec<VimdocSection>,
}

impl VimdocDocument {
    pub fn new(filename: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            project: project.into(),
            sections: Vec::new(),
        }
    }

    pub fn render(&self, width: usize) -> Vec<String> {
        let mut lines = vec![format!("*{}*", escape_tag(&self.filename))];
        lines.push(String::new());

        lines.push("-".repeat(width));
        lines.extend(leftright(
            "CONTENTS",
            &format!("*{}*", escape_tag(&format!("{}-contents", self.project))),
            width,
        ));
        lines.push(String::new());
        for (i, section) in self.sections.iter().enumerate() {
            let left = format!("  {}. {}", i + 1, title_case(&section.name));
            let right = format!("|{}|", escape_tag(&section.tag));
            let used = left.chars().count() + right.chars().count();
            let dots = width.saturating_sub(used).max(1);
            lines.push(format!("{}{}{}", left, ".".repeat(dots), right));
        }
        lines.push(String::new());

        for section in &self.sections {
            lines.push("-".repeat(width));
            lines.extend(leftright(
                &escape_text(&section.name.to_uppercase()),
                &format!("*{}*", escape_tag(&section.tag)),
                width,
            ));
            lines.extend(section.body.iter().cloned());
            lines.push(String::new());
        }

        lines.push("=".repeat(width));
        lines.push(format!("vim:tw={}:ts=2:ft=help:norl:syntax=help:", width));
        lines
    }
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
