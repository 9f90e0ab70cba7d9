//! Declarative (`.json`) goal files.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::goal::{Goal, GoalSource};
use crate::error::GoalLoadError;

/// Largest goal or prompt file that will be read.
pub const MAX_GOAL_FILE_SIZE: u64 = 1 << 20;

/// Generic interpreter used when a goal does not carry its own script.
pub const DEFAULT_GOAL_SCRIPT: &str = include_str!("builtin/goal.js");

static GOAL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]*$").expect("goal name regex must compile"));

/// Alphanumeric plus hyphens, not starting with a hyphen.
pub fn is_valid_goal_name(name: &str) -> bool {
    GOAL_NAME.is_match(name)
}

/// A goal-looking file found in a directory. `name` is derived from the
/// file name and is only a hint; the loaded goal's own name wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalFileCandidate {
    pub path: PathBuf,
    pub name: String,
}

/// Parse and validate a declarative goal document.
///
/// `path` is used for error reporting only.
pub fn parse_goal(data: &[u8], path: &Path) -> Result<Goal, GoalLoadError> {
    let mut goal: Goal = serde_json::from_slice(data).map_err(|source| GoalLoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    validate(&goal, path)?;

    if goal.script.is_empty() {
        goal.script = DEFAULT_GOAL_SCRIPT.to_string();
    }

    Ok(goal)
}

pub(crate) fn validate(goal: &Goal, path: &Path) -> Result<(), GoalLoadError> {
    let invalid = |reason: String| GoalLoadError::Invalid {
        path: path.to_path_buf(),
        reason,
    };

    if goal.name.is_empty() {
        return Err(invalid("Name is required".to_string()));
    }
    if !is_valid_goal_name(&goal.name) {
        return Err(invalid(format!(
            "Name must be alphanumeric with hyphens only (no spaces): {:?}",
            goal.name
        )));
    }
    if goal.description.is_empty() {
        return Err(invalid("Description is required".to_string()));
    }
    Ok(())
}

/// Read a regular file, refusing anything over [`MAX_GOAL_FILE_SIZE`].
///
/// The type check happens before opening, since opening a FIFO blocks.
/// The read itself is capped, so a file that grows after the size check
/// is still rejected.
pub(crate) fn read_capped(path: &Path) -> Result<Vec<u8>, GoalLoadError> {
    let io_err = |source| GoalLoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let too_large = |size| GoalLoadError::TooLarge {
        path: path.to_path_buf(),
        size,
        max: MAX_GOAL_FILE_SIZE,
    };

    let meta = fs::metadata(path).map_err(io_err)?;
    if !meta.is_file() {
        return Err(GoalLoadError::NotAFile(path.to_path_buf()));
    }
    if meta.len() > MAX_GOAL_FILE_SIZE {
        return Err(too_large(meta.len()));
    }

    let mut data = Vec::with_capacity(meta.len() as usize);
    File::open(path)
        .and_then(|file| file.take(MAX_GOAL_FILE_SIZE + 1).read_to_end(&mut data))
        .map_err(io_err)?;
    if data.len() as u64 > MAX_GOAL_FILE_SIZE {
        return Err(too_large(data.len() as u64));
    }

    Ok(data)
}

/// Load a goal from a `.json` file.
pub fn load_goal_from_file(path: &Path) -> Result<Goal, GoalLoadError> {
    let data = read_capped(path)?;
    let mut goal = parse_goal(&data, path)?;

    goal.file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    goal.source = GoalSource::File(path.to_path_buf());

    Ok(goal)
}

/// Files in `dir` whose name ends with `.json` (any case).
///
/// A missing directory yields no candidates. Results are sorted by file name.
pub fn find_goal_files(dir: &Path) -> anyhow::Result<Vec<GoalFileCandidate>> {
    scan_dir(dir, ".json", false)
}

/// Enumerate regular files in `dir` with the given lowercase suffix.
///
/// Symlinked entries are resolved before type-checking; broken links are
/// skipped silently.
pub(crate) fn scan_dir(
    dir: &Path,
    suffix: &str,
    tolerate_permission_denied: bool,
) -> anyhow::Result<Vec<GoalFileCandidate>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) if tolerate_permission_denied && e.kind() == ErrorKind::PermissionDenied => {
            debug!("permission denied reading {}", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("failed to read directory {}", dir.display())))
        }
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("failed to read entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !file_name.to_ascii_lowercase().ends_with(suffix) {
            continue;
        }

        let path = entry.path();
        // fs::metadata follows symlinks.
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => continue,
            Err(_) => continue,
        }

        let stem_len = file_name.len() - suffix.len();
        let name = file_name.get(..stem_len).unwrap_or(&file_name).to_string();
        candidates.push(GoalFileCandidate { path, name });
    }

    candidates.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_goal_name_pattern() {
        assert!(is_valid_goal_name("review"));
        assert!(is_valid_goal_name("Doc-Gen-2"));
        assert!(is_valid_goal_name("7up"));
        assert!(!is_valid_goal_name(""));
        assert!(!is_valid_goal_name("-leading"));
        assert!(!is_valid_goal_name("bad name"));
        assert!(!is_valid_goal_name("under_score"));
    }

    #[test]
    fn test_load_goal_sets_provenance_and_default_script() {
        let temp = TempDir::new().unwrap();
        let path = write(
            temp.path(),
            "review.json",
            r#"{"Name": "review", "Description": "Review code", "Category": "quality"}"#,
        );

        let goal = load_goal_from_file(&path).unwrap();
        assert_eq!(goal.name, "review");
        assert_eq!(goal.category, "quality");
        assert_eq!(goal.file_name, "review.json");
        assert_eq!(goal.source, GoalSource::File(path));
        assert_eq!(goal.script, DEFAULT_GOAL_SCRIPT);
    }

    #[test]
    fn test_embedded_script_kept() {
        let goal = parse_goal(
            br#"{"Name": "x", "Description": "d", "Script": "custom()"}"#,
            Path::new("x.json"),
        )
        .unwrap();
        assert_eq!(goal.script, "custom()");
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            r#"{"Description": "no name"}"#,
            r#"{"Name": "bad name", "Description": "space"}"#,
            r#"{"Name": "ok"}"#,
        ];
        for case in cases {
            let err = parse_goal(case.as_bytes(), Path::new("g.json")).unwrap_err();
            assert!(matches!(err, GoalLoadError::Invalid { .. }), "{case}");
        }

        let err = parse_goal(b"{not json", Path::new("g.json")).unwrap_err();
        assert!(matches!(err, GoalLoadError::Json { .. }));
    }

    #[test]
    fn test_oversized_file_rejected() {
        let temp = TempDir::new().unwrap();
        let padding = " ".repeat(MAX_GOAL_FILE_SIZE as usize);
        let path = write(
            temp.path(),
            "big.json",
            &format!(r#"{{"Name": "big", "Description": "d"{}}}"#, padding),
        );

        let err = load_goal_from_file(&path).unwrap_err();
        assert!(matches!(err, GoalLoadError::TooLarge { .. }));
    }

    #[test]
    fn test_read_capped_limits() {
        let temp = TempDir::new().unwrap();
        let exact = temp.path().join("exact.bin");
        fs::write(&exact, vec![b'a'; MAX_GOAL_FILE_SIZE as usize]).unwrap();
        assert_eq!(read_capped(&exact).unwrap().len() as u64, MAX_GOAL_FILE_SIZE);

        let over = temp.path().join("over.bin");
        fs::write(&over, vec![b'a'; MAX_GOAL_FILE_SIZE as usize + 1]).unwrap();
        assert!(matches!(read_capped(&over), Err(GoalLoadError::TooLarge { .. })));

        assert!(matches!(read_capped(temp.path()), Err(GoalLoadError::NotAFile(_))));
    }

    #[test]
    fn test_find_goal_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.json", "{}");
        write(temp.path(), "A.JSON", "{}");
        write(temp.path(), "notes.txt", "");
        fs::create_dir(temp.path().join("dir.json")).unwrap();

        let found = find_goal_files(temp.path()).unwrap();
        let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "b"]);
    }

    #[test]
    fn test_find_goal_files_missing_dir() {
        let temp = TempDir::new().unwrap();
        assert!(find_goal_files(&temp.path().join("nope")).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_find_goal_files_follows_links() {
        let temp = TempDir::new().unwrap();
        let target = write(temp.path(), "real.txt", "{}");
        std::os::unix::fs::symlink(&target, temp.path().join("linked.json")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone"), temp.path().join("broken.json"))
            .unwrap();

        let found = find_goal_files(temp.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "linked");
    }
}
