//! Error and diagnostic types.
//!
//! Only [`RegistryError`] aborts a run. Every [`Diagnostic`] is recovered
//! from and collected so the caller can decide whether warnings fail a build.

use crate::model::SourceLocation;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors while building a registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("source root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid exclude pattern `{pattern}`: {source}")]
    Exclude {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// How a function's documented parameters disagree with its signature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    #[error("parameter `{0}` has no @param tag")]
    MissingTag(String),

    #[error("@param `{0}` is not in the signature")]
    UnknownParam(String),

    #[error("@param order ({documented}) differs from signature ({declared})")]
    Order { documented: String, declared: String },
}

/// A recoverable problem found while parsing or resolving.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("{location}: malformed @{directive} tag: {reason}")]
    MalformedTag {
        location: SourceLocation,
        directive: String,
        reason: &'static str,
    },

    #[error("{location}: unresolved type reference `{name}`")]
    UnresolvedTypeReference {
        location: SourceLocation,
        name: String,
    },

    #[error("duplicate name `{name}`: declared at {first} and {second}")]
    DuplicateTypeName {
        name: String,
        first: SourceLocation,
        second: SourceLocation,
    },

    #[error("{location}: {function}: {mismatch}")]
    SignatureMismatch {
        location: SourceLocation,
        function: String,
        mismatch: Mismatch,
    },
}

impl Diagnostic {
    /// The location the diagnostic is reported at (the later one for duplicates).
    pub fn location(&self) -> &SourceLocation {
        match self {
            Self::MalformedTag { location, .. }
            | Self::UnresolvedTypeReference { location, .. }
            | Self::SignatureMismatch { location, .. } => location,
            Self::DuplicateTypeName { second, .. } => second,
        }
    }
}
