//! GitHub-flavored markdown renderer for README API sections.

use crate::model::*;
use crate::registry::Registry;
use crate::render::{call_signature, referenced_types, Renderer};

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, functions: &[&FunctionDoc], registry: &Registry) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();

        for func in functions {
            lines.extend(render_function(func));
        }

        let types = referenced_types(functions, registry);
        if !types.is_empty() {
            lines.push("### Types".to_string());
            lines.push(String::new());
            lines.push("| Type | Kind | Fields |".to_string());
            lines.push("| ---- | ---- | ------ |".to_string());
            for ty in types {
                lines.push(format!(
                    "| {} | {} | {} |",
                    code(&ty.name),
                    ty.kind.label(),
                    type_fields(ty)
                ));
            }
            lines.push(String::new());
        }

        // No trailing blank line; callers frame the section themselves.
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        lines
    }

    fn format_name(&self) -> &str {
        "markdown"
    }
}

/// Render a single function's documentation block.
fn render_function(func: &FunctionDoc) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!(
        "### {}",
        call_signature(func, |p| p.name.clone())
    ));
    lines.push(String::new());

    // Synthesized call signature
    let mut signature = call_signature(func, |p| {
        if p.optional {
            format!("{}?", p.name)
        } else {
            p.name.clone()
        }
    });
    if !func.returns.is_empty() {
        let returns: Vec<String> = func.returns.iter().map(|r| r.ty.to_string()).collect();
        signature.push_str(": ");
        signature.push_str(&returns.join(", "));
    }
    lines.push("```lua".to_string());
    lines.push(signature);
    lines.push("```".to_string());
    lines.push(String::new());

    if let Some(ref reason) = func.deprecated {
        if reason.is_empty() {
            lines.push("> **Deprecated**".to_string());
        } else {
            lines.push(format!("> **Deprecated**: {}", reason));
        }
        lines.push(String::new());
    }

    if !func.description.is_empty() {
        for paragraph in func.description.split("\n\n") {
            lines.push(paragraph.to_string());
            lines.push(String::new());
        }
    }

    if !func.params.is_empty() {
        lines.push("| Param | Type | Desc |".to_string());
        lines.push("| ----- | ---- | ---- |".to_string());
        for param in &func.params {
            lines.push(format!(
                "| {} | {} | {} |",
                cell(&param.name),
                code(&param.ty.to_string()),
                cell(param.description.as_deref().unwrap_or(""))
            ));
        }
        lines.push(String::new());
    }

    if !func.returns.is_empty() {
        lines.push("| Returns | Desc |".to_string());
        lines.push("| ------- | ---- |".to_string());
        for ret in &func.returns {
            lines.push(format!(
                "| {} | {} |",
                code(&ret.ty.to_string()),
                cell(ret.description.as_deref().unwrap_or(""))
            ));
        }
        lines.push(String::new());
    }

    if let Some(ref note) = func.note {
        lines.push("**Note:**".to_string());
        lines.push("<pre>".to_string());
        lines.extend(note.lines().map(escape_html));
        lines.push("</pre>".to_string());
        lines.push(String::new());
    }

    lines
}

/// Fields, variants or aliased type of a declaration, as one table cell.
fn type_fields(ty: &TypeDoc) -> String {
    let entries: Vec<String> = match &ty.kind {
        TypeKind::Record { parents, fields } => {
            let mut entries = Vec::new();
            if !parents.is_empty() {
                let parents: Vec<String> = parents.iter().map(|p| code(&p.to_string())).collect();
                entries.push(format!("extends {}", parents.join(", ")));
            }
            for field in fields {
                let name = if field.optional && !field.ty.is_optional() {
                    format!("{}?", field.name)
                } else {
                    field.name.clone()
                };
                entries.push(entry(&name, &field.ty.to_string(), field.description.as_deref()));
            }
            entries
        }
        TypeKind::Enum(variants) => variants
            .iter()
            .map(|v| match &v.description {
                Some(desc) => format!("{} {}", code(&v.value), cell(desc)),
                None => code(&v.value),
            })
            .collect(),
        TypeKind::Alias(aliased) => vec![code(&aliased.to_string())],
    };
    entries.join("<br>")
}

fn entry(name: &str, ty: &str, description: Option<&str>) -> String {
    match description {
        Some(desc) => format!("{} {} {}", cell(name), code(ty), cell(desc)),
        None => format!("{} {}", cell(name), code(ty)),
    }
}

/// Inline code inside a table cell.
fn code(text: &str) -> String {
    format!("`{}`", text.replace('|', "\\|"))
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn escape_html(line: &str) -> String {
    line.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
