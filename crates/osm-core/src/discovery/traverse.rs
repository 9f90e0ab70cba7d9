use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::config::{trace, DebugSink};

/// Walk upward from `start`, collecting every `<dir>/<pattern>` that is a
/// directory.
///
/// At most `max_depth` directories are visited. The walk stops early at the
/// filesystem root, on a directory whose resolved path was already visited,
/// or when a directory cannot be resolved. Results are nearest-first.
pub fn traverse_upward(
    start: &Path,
    max_depth: usize,
    patterns: &[String],
    sink: Option<&DebugSink>,
) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut dir = start.to_path_buf();

    for _ in 0..max_depth {
        let real = match fs::canonicalize(&dir) {
            Ok(real) => real,
            Err(err) if err.kind() == ErrorKind::PermissionDenied => {
                warn!("permission denied resolving {}: {}", dir.display(), err);
                trace(
                    sink,
                    format_args!("traversal: permission denied at {}: {}", dir.display(), err),
                );
                break;
            }
            Err(err) => {
                debug!("cannot resolve {}: {}", dir.display(), err);
                trace(
                    sink,
                    format_args!(
                        "traversal: symlink resolution failed at {}: {}",
                        dir.display(),
                        err
                    ),
                );
                break;
            }
        };

        if !visited.insert(real.clone()) {
            trace(
                sink,
                format_args!(
                    "traversal: symlink cycle detected at {} (real: {}), stopping",
                    dir.display(),
                    real.display()
                ),
            );
            break;
        }

        for pattern in patterns {
            let candidate = dir.join(pattern);
            match fs::metadata(&candidate) {
                Ok(meta) if meta.is_dir() => {
                    trace(
                        sink,
                        format_args!("traversal: found directory {}", candidate.display()),
                    );
                    found.push(candidate);
                }
                Ok(_) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!("cannot check {}: {}", candidate.display(), err);
                    trace(
                        sink,
                        format_args!("traversal: error checking {}: {}", candidate.display(), err),
                    );
                }
            }
        }

        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => {
                trace(
                    sink,
                    format_args!("traversal: reached filesystem root at {}", dir.display()),
                );
                break;
            }
        }
    }

    if found.is_empty() {
        trace(
            sink,
            format_args!(
                "traversal: no directories found in {} levels from {}",
                max_depth,
                start.display()
            ),
        );
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn patterns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_finds_ancestors_nearest_first() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("goals")).unwrap();
        fs::create_dir_all(root.join("a/goals")).unwrap();
        fs::create_dir_all(root.join("a/b/c")).unwrap();

        let found = traverse_upward(&root.join("a/b/c"), 10, &patterns(&["goals"]), None);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0], root.join("a/goals"));
        assert_eq!(found[1], root.join("goals"));
    }

    #[test]
    fn test_all_patterns_checked_per_level() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("osm-goals")).unwrap();
        fs::create_dir_all(root.join("goals")).unwrap();

        let found = traverse_upward(root, 1, &patterns(&["osm-goals", "goals"]), None);

        assert_eq!(found, vec![root.join("osm-goals"), root.join("goals")]);
    }

    #[test]
    fn test_depth_bound() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("goals")).unwrap();
        fs::create_dir_all(root.join("a/b")).unwrap();

        // a/b and a are visited; root is the third level.
        let found = traverse_upward(&root.join("a/b"), 2, &patterns(&["goals"]), None);
        assert!(found.is_empty());

        let found = traverse_upward(&root.join("a/b"), 3, &patterns(&["goals"]), None);
        assert_eq!(found, vec![root.join("goals")]);
    }

    #[test]
    fn test_files_named_like_patterns_are_ignored() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("goals"), "not a dir").unwrap();

        let found = traverse_upward(temp.path(), 1, &patterns(&["goals"]), None);
        assert!(found.is_empty());
    }

    #[test]
    fn test_missing_start_yields_nothing() {
        let temp = TempDir::new().unwrap();
        let found = traverse_upward(&temp.path().join("gone"), 5, &patterns(&["goals"]), None);
        assert!(found.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_pattern_does_not_stop_walk() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/locked/goals")).unwrap();
        fs::create_dir(root.join("goals")).unwrap();
        let locked = root.join("a/locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        if fs::metadata(locked.join("goals")).is_ok() {
            // Running as root; permissions are not enforced.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let found = traverse_upward(&root.join("a"), 2, &patterns(&["locked/goals", "goals"]), None);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(found, vec![root.join("goals")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        std::os::unix::fs::symlink(root.join("a"), root.join("a/b/up")).unwrap();
        fs::create_dir(root.join("a/goals")).unwrap();

        // a/b/up/b/up/b resolves to a/b; its lexical parents revisit a/b and a.
        let start = root.join("a/b/up/b/up/b");
        let found = traverse_upward(&start, 100, &patterns(&["goals"]), None);

        assert!(found.len() <= 100);
        assert!(found.iter().any(|p| p.ends_with("goals")));
    }
}
