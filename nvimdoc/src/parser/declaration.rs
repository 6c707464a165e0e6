//! Declaration parser: turns a doc block plus the line after it into
//! function and type records.
//!
//! Tag order is preserved as written. A malformed tag is reported and
//! skipped; the rest of the block is still used.

use super::tokenizer::{Directive, DocBlock, DocLine, LineKind};
use super::types::{parse_type, parse_type_prefix};
use crate::diagnostic::{Diagnostic, Mismatch};
use crate::model::*;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::trace;

// -- Regex patterns -----------------------------------------------------------

// `function M.name(a, b)`, `local function name(a)`, `function M:name()`
static RE_FUNC_STMT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[[:blank:]]*(local[[:blank:]]+)?function[[:blank:]]+([A-Za-z_][A-Za-z0-9_.:]*)[[:blank:]]*\(([^)]*)\)")
        .unwrap()
});

// `M.name = function(a, b)`, `local name = function()`, `name = function()` in a table
static RE_FUNC_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[[:blank:]]*(local[[:blank:]]+)?([A-Za-z_][A-Za-z0-9_.]*)[[:blank:]]*=[[:blank:]]*function[[:blank:]]*\(([^)]*)\)")
        .unwrap()
});

// A declaration head whose parameter list continues on later lines
static RE_OPEN_PARAMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[[:blank:]]*(local[[:blank:]]+)?(?:function[[:blank:]]+[A-Za-z_][A-Za-z0-9_.:]*|[A-Za-z_][A-Za-z0-9_.]*[[:blank:]]*=[[:blank:]]*function)[[:blank:]]*\([^)]*$")
        .unwrap()
});

// Leading identifier of @param/@field bodies: `name`, `name?`, `...`, `[string]`
static RE_ENTRY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\.\.\.|\[[^\]]*\]|[A-Za-z_][A-Za-z0-9_]*)(\?)?(?:[[:blank:]]+(.*))?$").unwrap()
});

static RE_FIELD_SCOPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:public|private|protected|package)[[:blank:]]+").unwrap());

// `@class (exact) Name<T> : Parent, Other`
static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\([^)]*\)[[:blank:]]*)?([A-Za-z_][A-Za-z0-9_.]*)(?:<([^>]*)>)?[[:blank:]]*(?::[[:blank:]]*(.*))?$")
        .unwrap()
});

static RE_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_.]*)(?:[[:blank:]]+(.*))?$").unwrap()
});

static RE_GENERIC_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:blank:]]*([A-Za-z_][A-Za-z0-9_]*)").unwrap());

// -- Public API ---------------------------------------------------------------

/// A parsed declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Function(FunctionDoc),
    Type(TypeDoc),
}

/// A function declaration line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub declared_name: String,
    pub is_local: bool,
    /// Indented `key = function(...)`: a field of some table literal
    pub table_key: bool,
    pub params: Vec<String>,
}

/// Recognize a function declaration line.
pub fn parse_signature(line: &str) -> Option<Signature> {
    let (caps, assignment) = match RE_FUNC_STMT.captures(line) {
        Some(caps) => (caps, false),
        None => (RE_FUNC_ASSIGN.captures(line)?, true),
    };
    let params = caps[3]
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    let is_local = caps.get(1).is_some();
    let declared_name = caps[2].to_string();
    let table_key = assignment
        && !is_local
        && !declared_name.contains('.')
        && line.starts_with([' ', '\t']);
    Some(Signature {
        declared_name,
        is_local,
        table_key,
        params,
    })
}

/// The declaration text starting at `lines[idx]`. A parameter list left open
/// on that line is joined with the following lines up to its `)`.
pub fn signature_text<'a>(lines: &[&'a str], idx: usize) -> Cow<'a, str> {
    let first = lines[idx];
    let head = strip_comment(first);
    if !RE_OPEN_PARAMS.is_match(head) {
        return Cow::Borrowed(first);
    }
    let mut joined = head.trim_end().to_string();
    for line in &lines[idx + 1..] {
        let part = strip_comment(line).trim();
        joined.push(' ');
        joined.push_str(part);
        if part.contains(')') {
            return Cow::Owned(joined);
        }
    }
    Cow::Borrowed(first)
}

fn strip_comment(line: &str) -> &str {
    line.find("--").map_or(line, |i| &line[..i])
}

/// Parse one doc block. `decl_line` is the source line following the block
/// (`decl_index` its 0-based index); `None` at end of file.
///
/// A block with `@class`/`@alias` tags yields one type per such tag.
/// Otherwise a function is produced only if `decl_line` declares one.
pub fn parse_declaration(
    block: &DocBlock,
    decl_line: Option<&str>,
    file: &str,
    decl_index: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Declaration> {
    if block.has_tag(&Directive::Class) || block.has_tag(&Directive::Alias) {
        return parse_types(block, file, diagnostics)
            .into_iter()
            .map(Declaration::Type)
            .collect();
    }

    let Some(signature) = decl_line.and_then(parse_signature) else {
        if !block.is_empty() {
            trace!("{}:{}: doc block without declaration", file, decl_index + 1);
        }
        return Vec::new();
    };

    let location = SourceLocation::new(file, decl_index + 1);
    vec![Declaration::Function(parse_function(
        block,
        signature,
        location,
        diagnostics,
    ))]
}

// -- Functions ----------------------------------------------------------------

/// Where the next prose line belongs.
#[derive(Clone, Copy)]
enum Target {
    Description,
    Param(usize),
    Return(usize),
    Field(usize),
    Variant(usize),
    Note,
    Deprecated,
    Ignore,
}

fn parse_function(
    block: &DocBlock,
    signature: Signature,
    location: SourceLocation,
    diagnostics: &mut Vec<Diagnostic>,
) -> FunctionDoc {
    let mut description = Paragraphs::default();
    let mut params: Vec<Param> = Vec::new();
    let mut returns: Vec<ReturnDoc> = Vec::new();
    let mut note: Option<String> = None;
    let mut deprecated: Option<String> = None;
    let mut generics: Vec<String> = Vec::new();
    let mut private = false;
    let mut target = Target::Description;

    for (i, doc_line) in block.lines.iter().enumerate() {
        let (directive, body) = match &doc_line.kind {
            LineKind::Prose(text) => {
                match target {
                    Target::Description => description.push(text),
                    Target::Param(i) => append(&mut params[i].description, text),
                    Target::Return(i) => append(&mut returns[i].description, text),
                    Target::Note => append_line(&mut note, text),
                    Target::Deprecated => append(&mut deprecated, text),
                    Target::Field(_) | Target::Variant(_) | Target::Ignore => {}
                }
                continue;
            }
            LineKind::Variant(_) => continue,
            LineKind::Tag { directive, body } => (directive, body.as_str()),
        };

        let here = SourceLocation::new(location.file.clone(), doc_line.line);
        let variants = || variant_union(&block.lines[i + 1..]);
        target = Target::Ignore;
        match directive {
            Directive::Param => match parse_entry(body, variants) {
                Ok(entry) => {
                    params.push(Param {
                        optional: entry.optional || entry.ty.is_optional(),
                        name: entry.name,
                        ty: entry.ty,
                        description: entry.description,
                    });
                    target = Target::Param(params.len() - 1);
                }
                Err(reason) => diagnostics.push(malformed(here, directive, reason)),
            },
            Directive::Return => match parse_returns(body, variants) {
                Ok(list) => {
                    returns.extend(list);
                    target = Target::Return(returns.len() - 1);
                }
                Err(reason) => diagnostics.push(malformed(here, directive, reason)),
            },
            Directive::Generic => {
                let names = generic_names(body);
                if names.is_empty() {
                    diagnostics.push(malformed(here, directive, "missing generic name"));
                }
                generics.extend(names);
            }
            Directive::Private => private = true,
            Directive::Deprecated => {
                deprecated = Some(tag_text(body).unwrap_or_default());
                target = Target::Deprecated;
            }
            Directive::Note => {
                note = Some(tag_text(body).unwrap_or_default());
                target = Target::Note;
            }
            Directive::Field | Directive::Class | Directive::Alias | Directive::Other(_) => {
                trace!("{}: ignoring @{} on a function", here, directive.keyword());
            }
        }
    }

    let declared_name = signature.declared_name;
    let name = declared_name
        .rsplit(['.', ':'])
        .next()
        .unwrap_or(&declared_name)
        .to_string();

    if !block.is_empty() {
        check_signature(&name, &params, &signature.params, &location, diagnostics);
    }

    // No usable @param tag: fall back to the declared names.
    if params.is_empty() {
        params = signature
            .params
            .iter()
            .map(|p| Param {
                name: p.clone(),
                ty: TypeRef::any(),
                description: None,
                optional: false,
            })
            .collect();
    }

    let visibility = if private {
        Visibility::Private
    } else if signature.is_local || (signature.table_key && block.is_empty()) {
        Visibility::Local
    } else if name.starts_with('_') {
        Visibility::Private
    } else {
        Visibility::Public
    };

    FunctionDoc {
        name,
        declared_name,
        params,
        returns,
        description: description.finish(),
        note,
        deprecated,
        generics,
        visibility,
        location,
    }
}

/// Compare documented parameter names with the declaration's parameter list.
fn check_signature(
    function: &str,
    params: &[Param],
    declared: &[String],
    location: &SourceLocation,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let documented: Vec<&str> = params
        .iter()
        .map(|p| p.name.as_str())
        .filter(|n| *n != "self")
        .collect();
    let declared: Vec<&str> = declared
        .iter()
        .map(String::as_str)
        .filter(|n| *n != "self")
        .collect();

    let mut report = |mismatch: Mismatch| {
        diagnostics.push(Diagnostic::SignatureMismatch {
            location: location.clone(),
            function: function.to_string(),
            mismatch,
        });
    };

    let mut same_names = true;
    for name in declared.iter().filter(|n| !documented.contains(n)) {
        report(Mismatch::MissingTag(name.to_string()));
        same_names = false;
    }
    for name in documented.iter().filter(|n| !declared.contains(n)) {
        report(Mismatch::UnknownParam(name.to_string()));
        same_names = false;
    }
    if same_names && documented != declared {
        report(Mismatch::Order {
            documented: documented.join(", "),
            declared: declared.join(", "),
        });
    }
}

// -- Types --------------------------------------------------------------------

struct TypeBuilder {
    name: String,
    generics: Vec<String>,
    location: SourceLocation,
    description: Paragraphs,
    record: bool,
    parents: Vec<TypeRef>,
    fields: Vec<FieldDoc>,
    aliased: Option<TypeRef>,
    variants: Vec<(TypeRef, Option<String>)>,
}

impl TypeBuilder {
    fn new(name: &str, location: SourceLocation, description: Paragraphs, record: bool) -> Self {
        Self {
            name: name.to_string(),
            generics: Vec::new(),
            location,
            description,
            record,
            parents: Vec::new(),
            fields: Vec::new(),
            aliased: None,
            variants: Vec::new(),
        }
    }

    fn finish(self) -> TypeDoc {
        let kind = if self.record {
            TypeKind::Record {
                parents: self.parents,
                fields: self.fields,
            }
        } else {
            alias_kind(self.aliased, self.variants)
        };
        TypeDoc {
            name: self.name,
            generics: self.generics,
            kind,
            description: self.description.finish(),
            location: self.location,
        }
    }
}

/// Literal-only aliases become enums; anything else stays an alias.
fn alias_kind(aliased: Option<TypeRef>, variants: Vec<(TypeRef, Option<String>)>) -> TypeKind {
    let mut alternatives: Vec<(TypeRef, Option<String>)> = match aliased {
        Some(TypeRef::Union(alts)) => alts.into_iter().map(|t| (t, None)).collect(),
        Some(ty) => vec![(ty, None)],
        None => Vec::new(),
    };
    alternatives.extend(variants);

    if alternatives.is_empty() {
        return TypeKind::Alias(TypeRef::any());
    }
    if alternatives
        .iter()
        .all(|(ty, _)| matches!(ty, TypeRef::Literal(_)))
    {
        return TypeKind::Enum(
            alternatives
                .into_iter()
                .map(|(ty, description)| Variant {
                    value: ty.to_string(),
                    description,
                })
                .collect(),
        );
    }

    let mut types: Vec<TypeRef> = alternatives.into_iter().map(|(ty, _)| ty).collect();
    if types.len() == 1 {
        TypeKind::Alias(types.remove(0))
    } else {
        TypeKind::Alias(TypeRef::Union(types))
    }
}

fn parse_types(block: &DocBlock, file: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<TypeDoc> {
    let mut types = Vec::new();
    let mut current: Option<TypeBuilder> = None;
    let mut leading = Paragraphs::default();
    let mut target = Target::Description;

    for (i, doc_line) in block.lines.iter().enumerate() {
        let here = SourceLocation::new(file, doc_line.line);
        let (directive, body) = match &doc_line.kind {
            LineKind::Prose(text) => {
                match (target, current.as_mut()) {
                    (Target::Description, Some(builder)) => builder.description.push(text),
                    (Target::Description, None) => leading.push(text),
                    (Target::Field(i), Some(builder)) => {
                        append(&mut builder.fields[i].description, text)
                    }
                    (Target::Variant(i), Some(builder)) => {
                        append(&mut builder.variants[i].1, text)
                    }
                    _ => {}
                }
                continue;
            }
            LineKind::Variant(text) => {
                if let Some(builder) = current.as_mut().filter(|b| !b.record) {
                    if let (Some(ty), rest) = parse_type_prefix(text) {
                        builder.variants.push((ty, tag_text(rest)));
                        target = Target::Variant(builder.variants.len() - 1);
                    }
                }
                continue;
            }
            LineKind::Tag { directive, body } => (directive, body.as_str()),
        };

        target = Target::Ignore;
        match directive {
            Directive::Class => {
                types.extend(current.take().map(TypeBuilder::finish));
                match RE_CLASS.captures(body) {
                    Some(caps) => {
                        let mut builder =
                            TypeBuilder::new(&caps[1], here, std::mem::take(&mut leading), true);
                        if let Some(generics) = caps.get(2) {
                            builder.generics = generic_names(generics.as_str());
                        }
                        if let Some(parents) = caps.get(3) {
                            builder.parents = parents
                                .as_str()
                                .split(',')
                                .map(str::trim)
                                .filter(|p| !p.is_empty())
                                .map(parse_type)
                                .collect();
                        }
                        current = Some(builder);
                        target = Target::Description;
                    }
                    None => diagnostics.push(malformed(here, directive, "missing class name")),
                }
            }
            Directive::Alias => {
                types.extend(current.take().map(TypeBuilder::finish));
                match RE_ALIAS.captures(body) {
                    Some(caps) => {
                        let mut builder =
                            TypeBuilder::new(&caps[1], here, std::mem::take(&mut leading), false);
                        if let Some(text) = caps.get(2) {
                            let (ty, rest) = parse_type_prefix(text.as_str());
                            builder.aliased = ty;
                            if let Some(extra) = tag_text(rest) {
                                builder.description.push(&extra);
                            }
                        }
                        current = Some(builder);
                        target = Target::Description;
                    }
                    None => diagnostics.push(malformed(here, directive, "missing alias name")),
                }
            }
            Directive::Field => match current.as_mut().filter(|b| b.record) {
                Some(builder) => {
                    let body = RE_FIELD_SCOPE.replace(body, "");
                    match parse_entry(&body, || variant_union(&block.lines[i + 1..])) {
                        Ok(entry) => {
                            builder.fields.push(FieldDoc {
                                optional: entry.optional || entry.ty.is_optional(),
                                name: entry.name,
                                ty: entry.ty,
                                description: entry.description,
                            });
                            target = Target::Field(builder.fields.len() - 1);
                        }
                        Err(reason) => diagnostics.push(malformed(here, directive, reason)),
                    }
                }
                None => trace!("{}: @field outside of a @class", here),
            },
            _ => trace!("{}: ignoring @{} on a type", here, directive.keyword()),
        }
    }

    types.extend(current.map(TypeBuilder::finish));
    types
}

// -- Helpers ------------------------------------------------------------------

/// `name[?] type [description]` as used by @param and @field.
struct Entry {
    name: String,
    optional: bool,
    ty: TypeRef,
    description: Option<String>,
}

/// `variants` supplies the type when the tag omits it and `---| value`
/// lines follow instead.
fn parse_entry(body: &str, variants: impl FnOnce() -> Option<TypeRef>) -> Result<Entry, &'static str> {
    let caps = RE_ENTRY_NAME
        .captures(body.trim())
        .ok_or("missing identifier")?;
    let rest = caps.get(3).map_or("", |m| m.as_str());
    let (ty, rest) = tag_type(rest);
    Ok(Entry {
        name: caps[1].to_string(),
        optional: caps.get(2).is_some(),
        ty: ty.or_else(variants).ok_or("missing type")?,
        description: tag_text(rest),
    })
}

/// `type[, type...] [description]`; the description belongs to the last value.
fn parse_returns(
    body: &str,
    variants: impl FnOnce() -> Option<TypeRef>,
) -> Result<Vec<ReturnDoc>, &'static str> {
    if let (None, rest) = tag_type(body) {
        let ty = variants().ok_or("missing type")?;
        return Ok(vec![ReturnDoc {
            ty,
            description: tag_text(rest),
        }]);
    }

    let mut tys = Vec::new();
    let mut rest = body;
    loop {
        let (ty, tail) = parse_type_prefix(rest);
        tys.push(ty.ok_or("missing type")?);
        match tail.trim_start().strip_prefix(',') {
            Some(next) => rest = next,
            None => {
                rest = tail;
                break;
            }
        }
    }

    let description = tag_text(rest);
    let last = tys.len() - 1;
    Ok(tys
        .into_iter()
        .enumerate()
        .map(|(i, ty)| ReturnDoc {
            ty,
            description: if i == last { description.clone() } else { None },
        })
        .collect())
}

/// Type expression leading a tag body; none when the body goes straight to
/// a `#` description.
fn tag_type(body: &str) -> (Option<TypeRef>, &str) {
    if body.trim_start().starts_with('#') {
        return (None, body);
    }
    parse_type_prefix(body)
}

/// Union of the `---| value` lines directly after a tag, if there are any.
fn variant_union(lines: &[DocLine]) -> Option<TypeRef> {
    let mut alternatives: Vec<TypeRef> = lines
        .iter()
        .map_while(|line| match &line.kind {
            LineKind::Variant(text) => Some(text),
            _ => None,
        })
        .filter_map(|text| parse_type_prefix(text).0)
        .collect();
    match alternatives.len() {
        0 => None,
        1 => alternatives.pop(),
        _ => Some(TypeRef::Union(alternatives)),
    }
}

/// Names of a `T, U : table` generic list.
fn generic_names(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|part| RE_GENERIC_NAME.captures(part))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Trailing tag text with an optional `#` separator removed.
fn tag_text(text: &str) -> Option<String> {
    let text = text.trim();
    let text = text.strip_prefix('#').unwrap_or(text).trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn malformed(location: SourceLocation, directive: &Directive, reason: &'static str) -> Diagnostic {
    Diagnostic::MalformedTag {
        location,
        directive: directive.keyword().to_string(),
        reason,
    }
}

/// Append prose to a tag description, separated by a single space.
fn append(dest: &mut Option<String>, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    match dest {
        Some(existing) if !existing.is_empty() => {
            existing.push(' ');
            existing.push_str(text);
        }
        _ => *dest = Some(text.to_string()),
    }
}

/// Append a line to preformatted text (notes keep their line breaks).
fn append_line(dest: &mut Option<String>, text: &str) {
    match dest {
        Some(existing) if !existing.is_empty() => {
            existing.push('\n');
            existing.push_str(text.trim_end());
        }
        _ if text.trim().is_empty() => {}
        _ => *dest = Some(text.trim_end().to_string()),
    }
}

/// Prose accumulator: lines join with a space, blank lines split paragraphs.
#[derive(Default)]
struct Paragraphs {
    done: Vec<String>,
    current: String,
}

impl Paragraphs {
    fn push(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            self.flush();
            return;
        }
        if !self.current.is_empty() {
            self.current.push(' ');
        }
        self.current.push_str(text);
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.done.push(std::mem::take(&mut self.current));
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        self.done.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokenizer::collect_block;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> (Vec<Declaration>, Vec<Diagnostic>) {
        let lines: Vec<&str> = src.lines().collect();
        let decl = lines.len() - 1;
        let block = collect_block(&lines, decl);
        let mut diagnostics = Vec::new();
        let decls = parse_declaration(&block, Some(lines[decl]), "init.lua", decl, &mut diagnostics);
        (decls, diagnostics)
    }

    fn function(src: &str) -> (FunctionDoc, Vec<Diagnostic>) {
        let (mut decls, diagnostics) = parse(src);
        assert_eq!(decls.len(), 1);
        match decls.remove(0) {
            Declaration::Function(func) => (func, diagnostics),
            other => panic!("expected function, got {:?}", other),
        }
    }

    fn types(src: &str) -> (Vec<TypeDoc>, Vec<Diagnostic>) {
        let lines: Vec<&str> = src.lines().collect();
        let block = collect_block(&lines, lines.len());
        let mut diagnostics = Vec::new();
        let decls = parse_declaration(&block, None, "types.lua", lines.len(), &mut diagnostics);
        let types = decls
            .into_iter()
            .map(|d| match d {
                Declaration::Type(ty) => ty,
                other => panic!("expected type, got {:?}", other),
            })
            .collect();
        (types, diagnostics)
    }

    #[test]
    fn signatures() {
        let sig = parse_signature("M.load = function(name, opts)").unwrap();
        assert_eq!(sig.declared_name, "M.load");
        assert_eq!(sig.params, vec!["name", "opts"]);
        assert!(!sig.is_local);

        let sig = parse_signature("local function helper()").unwrap();
        assert!(sig.is_local);
        assert!(sig.params.is_empty());

        let sig = parse_signature("function M:save(name, ...)").unwrap();
        assert_eq!(sig.declared_name, "M:save");
        assert_eq!(sig.params, vec!["name", "..."]);

        assert!(parse_signature("  callback = function()").unwrap().table_key);
        assert!(!parse_signature("M.setup = function()").unwrap().table_key);
        assert!(!parse_signature("  local on_exit = function()").unwrap().table_key);

        assert!(parse_signature("local x = 1").is_none());
        assert!(parse_signature("-- function commented(a)").is_none());
    }

    #[test]
    fn documented_function() {
        let (func, diagnostics) = function(
            "---Adds two numbers\n\
             ---@param a number The first\n\
             ---@param b number\n\
             ---   The second, on its own line\n\
             ---@return number\n\
             M.add = function(a, b)",
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(func.name, "add");
        assert_eq!(func.declared_name, "M.add");
        assert_eq!(func.description, "Adds two numbers");
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[0].description.as_deref(), Some("The first"));
        assert_eq!(
            func.params[1].description.as_deref(),
            Some("The second, on its own line")
        );
        assert_eq!(func.returns.len(), 1);
        assert_eq!(func.returns[0].ty.to_string(), "number");
        assert_eq!(func.location, SourceLocation::new("init.lua", 6));
        assert_eq!(func.visibility, Visibility::Public);
    }

    #[test]
    fn optional_params() {
        let (func, _) = function(
            "---@param name? string\n\
             ---@param opts table|nil\n\
             ---@param force boolean\n\
             function M.load(name, opts, force)",
        );
        assert!(func.params[0].optional);
        assert!(func.params[1].optional);
        assert!(!func.params[2].optional);
    }

    #[test]
    fn undocumented_function_uses_signature() {
        let (func, diagnostics) = function("local x = 1\nfunction M.setup(config)");
        assert!(diagnostics.is_empty());
        assert_eq!(func.description, "");
        assert_eq!(func.params.len(), 1);
        assert_eq!(func.params[0].name, "config");
        assert_eq!(func.params[0].ty, TypeRef::any());
    }

    #[test]
    fn tag_order_is_kept_and_mismatch_reported() {
        let (func, diagnostics) = function(
            "---@param b string\n\
             ---@param a string\n\
             function M.f(a, b)",
        );
        let names: Vec<&str> = func.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::SignatureMismatch {
                location: SourceLocation::new("init.lua", 3),
                function: "f".to_string(),
                mismatch: Mismatch::Order {
                    documented: "b, a".to_string(),
                    declared: "a, b".to_string(),
                },
            }]
        );
    }

    #[test]
    fn missing_and_unknown_params() {
        let (func, diagnostics) = function(
            "---Does things\n\
             ---@param ghost string\n\
             function M.f(real)",
        );
        assert_eq!(func.params.len(), 1);
        assert_eq!(func.params[0].name, "ghost");
        let mismatches: Vec<Mismatch> = diagnostics
            .into_iter()
            .map(|d| match d {
                Diagnostic::SignatureMismatch { mismatch, .. } => mismatch,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(
            mismatches,
            vec![
                Mismatch::MissingTag("real".to_string()),
                Mismatch::UnknownParam("ghost".to_string()),
            ]
        );
    }

    #[test]
    fn malformed_tag_is_skipped() {
        let (func, diagnostics) = function(
            "---@param\n\
             ---@param b\n\
             ---@param a number\n\
             ---@return\n\
             function M.f(a)",
        );
        assert_eq!(func.params.len(), 1);
        assert_eq!(func.params[0].name, "a");
        assert!(func.returns.is_empty());
        let reasons: Vec<&str> = diagnostics
            .iter()
            .map(|d| match d {
                Diagnostic::MalformedTag { reason, .. } => *reason,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(reasons, vec!["missing identifier", "missing type", "missing type"]);
        assert_eq!(diagnostics[0].location(), &SourceLocation::new("init.lua", 1));
    }

    #[test]
    fn signature_params_survive_malformed_tags() {
        let (func, diagnostics) = function(
            "---Save a session\n\
             ---@param\n\
             ---@param name\n\
             function M.save(name, opts)",
        );
        let names: Vec<&str> = func.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "opts"]);
        assert_eq!(func.params[0].ty, TypeRef::any());
        assert!(matches!(diagnostics[0], Diagnostic::MalformedTag { .. }));
        assert!(matches!(diagnostics[1], Diagnostic::MalformedTag { .. }));
    }

    #[test]
    fn variant_lines_supply_missing_types() {
        let (func, diagnostics) = function(
            "---@param mode # How to open\n\
             ---| \"split\" # Horizontal\n\
             ---| \"vsplit\"\n\
             ---@param count integer\n\
             ---@return\n\
             ---| \"ok\"\n\
             ---| \"failed\"\n\
             function M.open(mode, count)",
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[0].name, "mode");
        assert_eq!(func.params[0].ty.to_string(), "\"split\"|\"vsplit\"");
        assert_eq!(func.params[0].description.as_deref(), Some("How to open"));
        assert_eq!(func.params[1].ty.to_string(), "integer");
        assert_eq!(func.returns.len(), 1);
        assert_eq!(func.returns[0].ty.to_string(), "\"ok\"|\"failed\"");

        let (types, diagnostics) = types(
            "---@class demo.Layout\n\
             ---@field direction\n\
             ---| \"row\"\n\
             ---| \"column\"\n\
             ---@field gap integer",
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let TypeKind::Record { fields, .. } = &types[0].kind else {
            panic!("expected record");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].ty.to_string(), "\"row\"|\"column\"");
    }

    #[test]
    fn class_generics_are_recorded() {
        let (types, _) = types(
            "---@class demo.Cache<K, V> : demo.Base\n\
             ---@field entries table<K, V>",
        );
        assert_eq!(types[0].name, "demo.Cache");
        assert_eq!(types[0].generics, vec!["K", "V"]);
        let TypeKind::Record { parents, .. } = &types[0].kind else {
            panic!("expected record");
        };
        assert_eq!(parents, &vec![TypeRef::Named("demo.Base".to_string())]);
    }

    #[test]
    fn multiple_returns() {
        let (func, _) = function(
            "---@return string|nil, string? Error message\n\
             ---@return integer count\n\
             function M.f()",
        );
        assert_eq!(func.returns.len(), 3);
        assert_eq!(func.returns[0].description, None);
        assert_eq!(func.returns[1].description.as_deref(), Some("Error message"));
        assert_eq!(func.returns[2].description.as_deref(), Some("count"));
    }

    #[test]
    fn description_paragraphs_note_and_deprecation() {
        let (func, _) = function(
            "---First line\n\
             ---continues here.\n\
             ---\n\
             ---Second paragraph.\n\
             ---@deprecated use other\n\
             ---@note\n\
             ---  line one\n\
             ---  line two\n\
             function M.old()",
        );
        assert_eq!(func.description, "First line continues here.\n\nSecond paragraph.");
        assert_eq!(func.deprecated.as_deref(), Some("use other"));
        assert_eq!(func.note.as_deref(), Some(" line one\n line two"));
    }

    #[test]
    fn visibility_rules() {
        let (func, _) = function("---@private\nfunction M.hidden()");
        assert_eq!(func.visibility, Visibility::Private);
        let (func, _) = function("---Helper\nlocal function helper()");
        assert_eq!(func.visibility, Visibility::Local);
        let (func, _) = function("function M._internal()");
        assert_eq!(func.visibility, Visibility::Private);
        let (func, _) = function("function M:method()");
        assert_eq!(func.declared_name, "M:method");
        assert_eq!(func.name, "method");
    }

    #[test]
    fn generics_are_recorded() {
        let (func, diagnostics) = function(
            "---@generic T, U : table\n\
             ---@param value T\n\
             function M.id(value)",
        );
        assert!(diagnostics.is_empty());
        assert_eq!(func.generics, vec!["T", "U"]);
    }

    #[test]
    fn class_with_fields() {
        let (types, diagnostics) = types(
            "---Options for loading\n\
             ---@class resession.LoadOpts : resession.BaseOpts\n\
             ---@field attach? boolean Stay attached\n\
             ---   after loading\n\
             ---@field private reset boolean|\"auto\"\n\
             ---@field [string] any",
        );
        assert!(diagnostics.is_empty());
        assert_eq!(types.len(), 1);
        let ty = &types[0];
        assert_eq!(ty.name, "resession.LoadOpts");
        assert_eq!(ty.description, "Options for loading");
        assert_eq!(ty.location, SourceLocation::new("types.lua", 2));
        let TypeKind::Record { parents, fields } = &ty.kind else {
            panic!("expected record");
        };
        assert_eq!(parents, &vec![TypeRef::Named("resession.BaseOpts".to_string())]);
        assert_eq!(fields.len(), 3);
        assert!(fields[0].optional);
        assert_eq!(fields[0].description.as_deref(), Some("Stay attached after loading"));
        assert_eq!(fields[1].name, "reset");
        assert_eq!(fields[1].ty.to_string(), "boolean|\"auto\"");
        assert_eq!(fields[2].name, "[string]");
    }

    #[test]
    fn alias_variants() {
        let (types, _) = types(
            "---@alias resession.Hook\n\
             ---| \"pre_save\" # Before saving\n\
             ---| \"post_save\"\n\
             ---@alias resession.Name string|fun(): string",
        );
        assert_eq!(types.len(), 2);
        assert_eq!(
            types[0].kind,
            TypeKind::Enum(vec![
                Variant {
                    value: "\"pre_save\"".to_string(),
                    description: Some("Before saving".to_string()),
                },
                Variant {
                    value: "\"post_save\"".to_string(),
                    description: None,
                },
            ])
        );
        assert_eq!(types[1].kind.label(), "alias");
        let TypeKind::Alias(ty) = &types[1].kind else {
            panic!("expected alias");
        };
        assert_eq!(ty.to_string(), "string|fun(): string");
    }

    #[test]
    fn inline_literal_alias_is_enum() {
        let (types, _) = types("---@alias Mode \"a\"|\"b\"");
        assert_eq!(types[0].kind.label(), "enum");
    }

    #[test]
    fn malformed_class_drops_its_fields() {
        let (types, diagnostics) = types(
            "---@class\n\
             ---@field a string",
        );
        assert!(types.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }
}
