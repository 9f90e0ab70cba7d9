//! Candidate path normalization.

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use super::paths;
use crate::error::NormalizeError;

/// A raw directory candidate, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathCandidate {
    /// Built from a known anchor directory and the primary pattern.
    Standard(PathBuf),
    /// Declared by the user; may contain `~/` and `$VAR` references.
    Custom(String),
    /// Found by the upward traversal.
    Discovered(PathBuf),
}

impl PathCandidate {
    pub fn origin(&self) -> &'static str {
        match self {
            PathCandidate::Standard(_) => "standard",
            PathCandidate::Custom(_) => "custom",
            PathCandidate::Discovered(_) => "autodiscovered",
        }
    }
}

impl fmt::Display for PathCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathCandidate::Standard(p) | PathCandidate::Discovered(p) => {
                write!(f, "{}", p.display())
            }
            PathCandidate::Custom(raw) => f.write_str(raw),
        }
    }
}

/// An absolute, symlink-resolved directory path; the unit of deduplication.
///
/// Ordering is byte-wise on the path string, not component-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath(PathBuf);

impl NormalizedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl Ord for NormalizedPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.as_os_str().cmp(other.0.as_os_str())
    }
}

impl PartialOrd for NormalizedPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Expand a leading `~` and any `$VAR`/`${VAR}` references.
///
/// Unset variables expand to the empty string.
pub fn expand_path(raw: &str) -> PathBuf {
    let tilde = shellexpand::tilde(raw);
    let expanded = shellexpand::env_with_context_no_errors(tilde.as_ref(), |var| {
        Some(std::env::var(var).unwrap_or_default())
    });
    PathBuf::from(expanded.as_ref())
}

/// Normalize a candidate into an absolute, resolved, escape-checked path.
///
/// - `Ok(None)`: the candidate is empty and should be skipped.
/// - Resolution of the full path is best-effort: a missing target or a
///   broken link yields the cleaned absolute path.
/// - When the target does resolve, its parent must resolve too and must
///   strictly contain it; otherwise the candidate is rejected.
pub fn normalize(
    candidate: &PathCandidate,
    cwd: Option<&Path>,
) -> Result<Option<NormalizedPath>, NormalizeError> {
    let raw = match candidate {
        PathCandidate::Custom(raw) => {
            if raw.trim().is_empty() {
                return Ok(None);
            }
            expand_path(raw)
        }
        PathCandidate::Standard(path) | PathCandidate::Discovered(path) => {
            if path.as_os_str().is_empty() {
                return Ok(None);
            }
            path.clone()
        }
    };

    let cleaned = paths::clean(&raw);
    let absolute = if cleaned.is_absolute() {
        cleaned
    } else {
        let cwd = cwd.ok_or_else(|| NormalizeError::NoWorkingDirectory(cleaned.clone()))?;
        paths::clean(&cwd.join(&cleaned))
    };

    let resolved = match fs::canonicalize(&absolute) {
        Ok(resolved) => resolved,
        Err(_) => return Ok(Some(NormalizedPath(absolute))),
    };

    // The filesystem root has no parent to escape from.
    let Some(parent) = absolute.parent() else {
        return Ok(Some(NormalizedPath(resolved)));
    };

    let resolved_parent =
        fs::canonicalize(parent).map_err(|source| NormalizeError::ParentUnresolved {
            parent: parent.to_path_buf(),
            source,
        })?;

    if resolved == resolved_parent || !resolved.starts_with(&resolved_parent) {
        return Err(NormalizeError::Escape {
            candidate: absolute,
            resolved,
            parent: resolved_parent,
        });
    }

    Ok(Some(NormalizedPath(resolved)))
}
