//! Path segment helpers shared by normalization and scoring.
//!
//! All splitting and segment comparison goes through here so the rest of
//! discovery stays separator- and case-policy-agnostic.

use std::path::{Component, Path, PathBuf};

/// A path expressed relative to a base: `up` `..` steps, then `down`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relative {
    pub up: usize,
    pub down: Vec<String>,
}

/// Lexically clean a path: drop `.`, fold `name/..`, never climb above
/// the root. An empty result becomes `.`.
pub(crate) fn clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        PathBuf::from(".")
    } else {
        out.iter().collect()
    }
}

/// Compare two path segments under the platform's case policy.
pub(crate) fn segment_eq(a: &str, b: &str) -> bool {
    if cfg!(windows) || cfg!(target_os = "macos") {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

fn component_eq(a: &Component<'_>, b: &Component<'_>) -> bool {
    match (a, b) {
        (Component::Normal(x), Component::Normal(y)) => {
            segment_eq(&x.to_string_lossy(), &y.to_string_lossy())
        }
        _ => a == b,
    }
}

/// Express `target` relative to `base`. Both should be absolute.
///
/// Returns `None` when the two share no root (different drives).
pub(crate) fn relative(base: &Path, target: &Path) -> Option<Relative> {
    let base = clean(base);
    let target = clean(target);
    let base: Vec<Component<'_>> = base.components().collect();
    let target: Vec<Component<'_>> = target.components().collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| component_eq(a, b))
        .count();

    if common == 0 && base.first().map_or(false, |c| !matches!(c, Component::Normal(_))) {
        return None;
    }

    Some(Relative {
        up: base.len() - common,
        down: target[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect(),
    })
}

/// True if `path` is `dir` or lies beneath it. An empty `dir` matches nothing.
pub(crate) fn has_dir_prefix(path: &Path, dir: &Path) -> bool {
    if dir.as_os_str().is_empty() {
        return false;
    }
    matches!(relative(dir, path), Some(rel) if rel.up == 0)
}

/// Number of segments `path` sits below `base`.
pub(crate) fn depth_below(path: &Path, base: &Path) -> usize {
    relative(base, path).map_or(0, |rel| rel.down.len())
}

/// The plain name segments of a directory pattern such as `.github/goals`.
pub(crate) fn pattern_segments(pattern: &str) -> Vec<String> {
    clean(Path::new(pattern))
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
