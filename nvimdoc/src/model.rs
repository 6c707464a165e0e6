//! Data model for parsed documentation, format-agnostic.
//!
//! Everything here is built once per generation run by the parser and the
//! registry builder, then only read by the renderers.

use std::fmt;

/// Where a declaration (or a diagnostic) lives in the scanned tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SourceLocation {
    /// Path relative to the scanned root, always `/`-separated
    pub file: String,
    /// 1-based line number
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Built-in Lua / LuaLS type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Nil,
    Any,
    Unknown,
    Boolean,
    String,
    Number,
    Integer,
    Table,
    Function,
    Thread,
    Userdata,
    LightUserdata,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        let prim = match name {
            "nil" => Self::Nil,
            "any" => Self::Any,
            "unknown" => Self::Unknown,
            "boolean" => Self::Boolean,
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "table" => Self::Table,
            "function" => Self::Function,
            "thread" => Self::Thread,
            "userdata" => Self::Userdata,
            "lightuserdata" => Self::LightUserdata,
            _ => return None,
        };
        Some(prim)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Any => "any",
            Self::Unknown => "unknown",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Table => "table",
            Self::Function => "function",
            Self::Thread => "thread",
            Self::Userdata => "userdata",
            Self::LightUserdata => "lightuserdata",
        }
    }
}

/// A (possibly nested) type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Primitive(Primitive),
    /// A custom type name not (yet) matched to a declaration. After the
    /// registry's resolution pass, names left here are opaque.
    Named(String),
    /// A custom type name matched to a declared [`TypeDoc`]
    Custom(String),
    /// String, number or boolean literal, kept exactly as written
    Literal(String),
    Array(Box<TypeRef>),
    Optional(Box<TypeRef>),
    Union(Vec<TypeRef>),
    /// `name<A, B>`; for `table<K, V>` the args are `[K, V]`
    Container { name: String, args: Vec<TypeRef> },
    /// `fun(a: T, b?: U): R`
    Function {
        params: Vec<(String, TypeRef)>,
        returns: Vec<TypeRef>,
    },
    /// `{ key: T, ... }`
    Table(Vec<(String, TypeRef)>),
}

impl TypeRef {
    pub fn any() -> Self {
        Self::Primitive(Primitive::Any)
    }

    /// Whether the value may be omitted (`T?` or a union containing `nil`).
    pub fn is_optional(&self) -> bool {
        match self {
            Self::Optional(_) | Self::Primitive(Primitive::Nil) => true,
            Self::Union(alts) => alts.iter().any(Self::is_optional),
            _ => false,
        }
    }

    /// Visit this type and every type nested inside it, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a TypeRef)) {
        f(self);
        match self {
            Self::Array(inner) | Self::Optional(inner) => inner.walk(f),
            Self::Union(alts) | Self::Container { args: alts, .. } => {
                for alt in alts {
                    alt.walk(f);
                }
            }
            Self::Function { params, returns } => {
                for (_, ty) in params {
                    ty.walk(f);
                }
                for ty in returns {
                    ty.walk(f);
                }
            }
            Self::Table(fields) => {
                for (_, ty) in fields {
                    ty.walk(f);
                }
            }
            Self::Primitive(_) | Self::Named(_) | Self::Custom(_) | Self::Literal(_) => {}
        }
    }

    /// Rebuild this type with every `Named` leaf passed through `f`.
    pub fn map_names(self, f: &mut impl FnMut(String) -> TypeRef) -> TypeRef {
        match self {
            Self::Named(name) => f(name),
            Self::Array(inner) => Self::Array(Box::new(inner.map_names(f))),
            Self::Optional(inner) => Self::Optional(Box::new(inner.map_names(f))),
            Self::Union(alts) => Self::Union(alts.into_iter().map(|t| t.map_names(f)).collect()),
            Self::Container { name, args } => Self::Container {
                name,
                args: args.into_iter().map(|t| t.map_names(f)).collect(),
            },
            Self::Function { params, returns } => Self::Function {
                params: params
                    .into_iter()
                    .map(|(n, t)| (n, t.map_names(f)))
                    .collect(),
                returns: returns.into_iter().map(|t| t.map_names(f)).collect(),
            },
            Self::Table(fields) => Self::Table(
                fields
                    .into_iter()
                    .map(|(n, t)| (n, t.map_names(f)))
                    .collect(),
            ),
            other => other,
        }
    }

    fn needs_parens(&self) -> bool {
        matches!(self, Self::Union(_) | Self::Function { .. })
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.as_str()),
            Self::Named(name) | Self::Custom(name) | Self::Literal(name) => f.write_str(name),
            Self::Array(inner) if inner.needs_parens() => write!(f, "({})[]", inner),
            Self::Array(inner) => write!(f, "{}[]", inner),
            Self::Optional(inner) if inner.needs_parens() => write!(f, "({})?", inner),
            Self::Optional(inner) => write!(f, "{}?", inner),
            Self::Union(alts) => {
                for (i, alt) in alts.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{}", alt)?;
                }
                Ok(())
            }
            Self::Container { name, args } => {
                write!(f, "{}<", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
            Self::Function { params, returns } => {
                f.write_str("fun(")?;
                for (i, (name, ty)) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                f.write_str(")")?;
                for (i, ret) in returns.iter().enumerate() {
                    f.write_str(if i == 0 { ": " } else { ", " })?;
                    write!(f, "{}", ret)?;
                }
                Ok(())
            }
            Self::Table(fields) => {
                if fields.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// A documented function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    pub description: Option<String>,
    pub optional: bool,
}

/// One documented return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnDoc {
    pub ty: TypeRef,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    /// Declared with `local`, or an undocumented table-literal key
    Local,
    /// `@private` or a leading underscore
    Private,
}

/// A single documented function.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionDoc {
    /// Last segment of the declared name (`M.load` → `load`)
    pub name: String,
    /// Name exactly as declared (`M.load`, `M:load`, `load`)
    pub declared_name: String,
    pub params: Vec<Param>,
    pub returns: Vec<ReturnDoc>,
    /// Paragraphs separated by a blank line; empty when undocumented
    pub description: String,
    pub note: Option<String>,
    /// `Some("")` when deprecated without an explanation
    pub deprecated: Option<String>,
    /// Names from `@generic`
    pub generics: Vec<String>,
    pub visibility: Visibility,
    pub location: SourceLocation,
}

/// One entry in a record type's field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDoc {
    pub name: String,
    pub ty: TypeRef,
    pub description: Option<String>,
    pub optional: bool,
}

/// One alternative of an enum-like alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Literal exactly as written, quotes included
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// `@class` with its `@field`s
    Record {
        parents: Vec<TypeRef>,
        fields: Vec<FieldDoc>,
    },
    /// `@alias` whose alternatives are all literals
    Enum(Vec<Variant>),
    /// `@alias` of any other type expression
    Alias(TypeRef),
}

impl TypeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Record { .. } => "class",
            Self::Enum(_) => "enum",
            Self::Alias(_) => "alias",
        }
    }
}

/// A custom type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDoc {
    pub name: String,
    /// Parameters of `@class Name<T, U>`
    pub generics: Vec<String>,
    pub kind: TypeKind,
    pub description: String,
    pub location: SourceLocation,
}

impl TypeDoc {
    /// Every type expression mentioned by this declaration.
    pub fn type_refs(&self) -> Vec<&TypeRef> {
        match &self.kind {
            TypeKind::Record { parents, fields } => parents
                .iter()
                .chain(fields.iter().map(|field| &field.ty))
                .collect(),
            TypeKind::Enum(_) => Vec::new(),
            TypeKind::Alias(ty) => vec![ty],
        }
    }
}

impl FunctionDoc {
    /// Every type expression mentioned by this function's signature.
    pub fn type_refs(&self) -> Vec<&TypeRef> {
        self.params
            .iter()
            .map(|p| &p.ty)
            .chain(self.returns.iter().map(|r| &r.ty))
            .collect()
    }
}

/// Declarations found in a single source file, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDocs {
    pub functions: Vec<FunctionDoc>,
    pub types: Vec<TypeDoc>,
}
