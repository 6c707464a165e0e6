//! Registry builder: merges every file under a root into one
//! cross-referenced model.
//!
//! Resolution runs in two phases so that declaration order across files
//! does not matter:
//!
//! 1. parse every file (lexicographic path order) and index type names,
//!    keeping the first declaration of a duplicated name;
//! 2. rewrite every type reference against the finished index.

use crate::diagnostic::{Diagnostic, RegistryError};
use crate::model::*;
use crate::parser::{self, ParsedFile};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Fully resolved documentation for one generation run.
#[derive(Debug, Default)]
pub struct Registry {
    /// Declarations per file, keyed by `/`-separated path relative to the root
    pub files: BTreeMap<String, FileDocs>,
    /// Winning declaration for every type name
    types: BTreeMap<String, TypeDoc>,
    /// Everything recovered from while building, in discovery order
    pub diagnostics: Vec<Diagnostic>,
}

impl Registry {
    /// Build a registry from in-memory `(path, content)` pairs.
    pub fn from_sources<I, P, C>(sources: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: AsRef<str>,
    {
        let mut parsed: Vec<(String, ParsedFile)> = sources
            .into_iter()
            .map(|(path, content)| {
                let path = path.into();
                let file = parser::parse_source(&path, content.as_ref());
                (path, file)
            })
            .collect();
        parsed.sort_by(|a, b| a.0.cmp(&b.0));
        Self::from_parsed(parsed)
    }

    fn from_parsed(parsed: Vec<(String, ParsedFile)>) -> Self {
        let mut diagnostics = Vec::new();
        let mut files = BTreeMap::new();

        // Phase 1: index type names, first declaration wins.
        let mut index: BTreeMap<String, SourceLocation> = BTreeMap::new();
        for (path, file) in parsed {
            diagnostics.extend(file.diagnostics);
            for ty in &file.docs.types {
                match index.get(&ty.name) {
                    Some(first) => diagnostics.push(Diagnostic::DuplicateTypeName {
                        name: ty.name.clone(),
                        first: first.clone(),
                        second: ty.location.clone(),
                    }),
                    None => {
                        index.insert(ty.name.clone(), ty.location.clone());
                    }
                }
            }
            files.insert(path, file.docs);
        }

        // Phase 2: resolve references against the complete index.
        let mut resolver = Resolver {
            index: &index,
            diagnostics: Vec::new(),
            seen: HashSet::new(),
        };
        for (path, docs) in files.iter_mut() {
            for func in &mut docs.functions {
                let location = func.location.clone();
                let generics = std::mem::take(&mut func.generics);
                for param in &mut func.params {
                    resolver.resolve(&mut param.ty, &location, &generics);
                }
                for ret in &mut func.returns {
                    resolver.resolve(&mut ret.ty, &location, &generics);
                }
                func.generics = generics;

                let qualified = qualified_name(path, func);
                if let Some(type_location) = index.get(&qualified) {
                    let (first, second) = ordered(type_location.clone(), location);
                    resolver.diagnostics.push(Diagnostic::DuplicateTypeName {
                        name: qualified,
                        first,
                        second,
                    });
                }
            }
            for ty in &mut docs.types {
                let location = ty.location.clone();
                let generics = &ty.generics;
                match &mut ty.kind {
                    TypeKind::Record { parents, fields } => {
                        for parent in parents {
                            resolver.resolve(parent, &location, generics);
                        }
                        for field in fields {
                            resolver.resolve(&mut field.ty, &location, generics);
                        }
                    }
                    TypeKind::Alias(aliased) => resolver.resolve(aliased, &location, generics),
                    TypeKind::Enum(_) => {}
                }
            }
        }
        diagnostics.extend(resolver.diagnostics);

        let mut types = BTreeMap::new();
        for docs in files.values() {
            for ty in &docs.types {
                if index.get(&ty.name) == Some(&ty.location) {
                    types.insert(ty.name.clone(), ty.clone());
                }
            }
        }

        Self {
            files,
            types,
            diagnostics,
        }
    }

    /// Declarations of a single file.
    pub fn file(&self, path: &str) -> Option<&FileDocs> {
        self.files.get(path)
    }

    /// The declaration a type name resolves to.
    pub fn lookup_type(&self, name: &str) -> Option<&TypeDoc> {
        self.types.get(name)
    }

    /// Functions of a file that belong in user-facing documentation.
    pub fn public_functions(&self, path: &str) -> Vec<&FunctionDoc> {
        self.file(path)
            .map(|docs| {
                docs.functions
                    .iter()
                    .filter(|f| f.visibility == Visibility::Public)
                    .collect()
            })
            .unwrap_or_default()
    }
}

struct Resolver<'a> {
    index: &'a BTreeMap<String, SourceLocation>,
    diagnostics: Vec<Diagnostic>,
    seen: HashSet<(SourceLocation, String)>,
}

impl Resolver<'_> {
    fn resolve(&mut self, ty: &mut TypeRef, location: &SourceLocation, generics: &[String]) {
        let taken = std::mem::replace(ty, TypeRef::any());
        *ty = taken.map_names(&mut |name| {
            if self.index.contains_key(&name) {
                return TypeRef::Custom(name);
            }
            let expected = name == "self" || generics.contains(&name);
            if !expected && self.seen.insert((location.clone(), name.clone())) {
                self.diagnostics.push(Diagnostic::UnresolvedTypeReference {
                    location: location.clone(),
                    name: name.clone(),
                });
            }
            TypeRef::Named(name)
        });
    }
}

fn ordered(a: SourceLocation, b: SourceLocation) -> (SourceLocation, SourceLocation) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Lua module path for a file: `resession/init.lua` → `resession`,
/// `resession/config.lua` → `resession.config`.
pub fn module_name(path: &str) -> String {
    let stem = path.strip_suffix(".lua").unwrap_or(path);
    let stem = stem.strip_suffix("/init").unwrap_or(stem);
    stem.replace('/', ".")
}

/// Module-qualified function name used for collision checks.
fn qualified_name(path: &str, func: &FunctionDoc) -> String {
    if func.declared_name.contains(['.', ':']) {
        format!("{}.{}", module_name(path), func.name)
    } else {
        func.name.clone()
    }
}

/// Walks a root directory and builds a [`Registry`].
#[derive(Debug)]
pub struct RegistryBuilder {
    root: PathBuf,
    excludes: Vec<glob::Pattern>,
}

impl RegistryBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excludes: Vec::new(),
        }
    }

    /// Skip files whose root-relative path matches `pattern`.
    pub fn exclude(mut self, pattern: &str) -> Result<Self, RegistryError> {
        let compiled = glob::Pattern::new(pattern).map_err(|source| RegistryError::Exclude {
            pattern: pattern.to_string(),
            source,
        })?;
        self.excludes.push(compiled);
        Ok(self)
    }

    pub fn build(&self) -> Result<Registry, RegistryError> {
        if !self.root.is_dir() {
            return Err(RegistryError::RootNotFound(self.root.clone()));
        }

        let mut parsed = Vec::new();
        for (label, path) in self.source_files()? {
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            match parser::parse_file(&path, &label, &content) {
                Ok(file) => {
                    debug!(
                        "parsed {}: {} functions, {} types",
                        label,
                        file.docs.functions.len(),
                        file.docs.types.len()
                    );
                    parsed.push((label, file));
                }
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }

        Ok(Registry::from_parsed(parsed))
    }

    /// Lua files under the root as `(label, path)`, sorted by label.
    fn source_files(&self) -> Result<Vec<(String, PathBuf)>, RegistryError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) if source.depth() == 0 => {
                    return Err(RegistryError::Walk {
                        path: self.root.clone(),
                        source,
                    })
                }
                Err(e) => {
                    warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !path.extension().is_some_and(|ext| ext == "lua") {
                continue;
            }
            let label = relative_label(&self.root, path);
            if self.excludes.iter().any(|p| p.matches(&label)) {
                debug!("excluded {}", label);
                continue;
            }
            files.push((label, path.to_path_buf()));
        }
        files.sort();
        Ok(files)
    }
}

/// `/`-separated path of `path` relative to `root`.
fn relative_label(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build a registry from every `*.lua` file under `root`.
pub fn build_registry(root: impl AsRef<Path>) -> Result<Registry, RegistryError> {
    RegistryBuilder::new(root.as_ref()).build()
}
