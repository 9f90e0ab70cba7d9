//! Error types for discovery and goal loading.
//!
//! Only [`RegistryError`] ever reaches a caller of the registry; the other
//! kinds are logged and the offending candidate or file is skipped.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a candidate path could not be normalized.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The candidate's parent directory could not be resolved, so escape
    /// containment cannot be checked.
    #[error("failed to resolve base directory symlinks for {parent:?}: {source}")]
    ParentUnresolved {
        parent: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The candidate resolves to somewhere outside its own parent directory.
    #[error("symlink validation failed for {candidate:?}: resolved path {resolved:?} escapes parent {parent:?}")]
    Escape {
        candidate: PathBuf,
        resolved: PathBuf,
        parent: PathBuf,
    },

    /// A relative candidate was given but there is no working directory to
    /// anchor it to.
    #[error("cannot make {0:?} absolute: working directory unavailable")]
    NoWorkingDirectory(PathBuf),
}

/// Why a single goal file was rejected.
#[derive(Debug, Error)]
pub enum GoalLoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0:?} is not a regular file")]
    NotAFile(PathBuf),

    #[error("{path:?} is too large ({size} bytes, max {max})")]
    TooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("failed to parse goal JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid frontmatter in {path:?}: {reason}")]
    FrontMatter { path: PathBuf, reason: String },

    #[error("invalid goal definition in {path:?}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Errors surfaced by registry lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("goal not found: {0}")]
    NotFound(String),
}
