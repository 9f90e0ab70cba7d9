use std::path::Path;

use super::paths::{self, segment_eq};

/// Sentinel distance/depth for unrelated paths.
pub const INFINITE: usize = usize::MAX;

/// Priority of a discovered directory. Lower sorts first.
///
/// Field order matters: the derived `Ord` compares class, then distance,
/// then depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathScore {
    pub class: u8,
    pub distance: usize,
    pub depth: usize,
}

impl PathScore {
    pub const UNRELATED: PathScore = PathScore {
        class: 4,
        distance: INFINITE,
        depth: INFINITE,
    };

    const fn new(class: u8, distance: usize, depth: usize) -> Self {
        Self {
            class,
            distance,
            depth,
        }
    }
}

/// Score `path` against the anchor directories.
///
/// All paths are expected to be absolute and already resolved; missing
/// anchors simply never match.
pub fn score(
    path: &Path,
    cwd: Option<&Path>,
    config_dir: Option<&Path>,
    exec_dir: Option<&Path>,
    patterns: &[String],
) -> PathScore {
    if let Some(rel) = cwd.and_then(|cwd| paths::relative(cwd, path)) {
        if rel.up == 0 {
            let below = rel.down.len();
            return PathScore::new(0, below, below);
        }
        if matches_ancestor_pattern(&rel.down, patterns) {
            return PathScore::new(1, rel.up, rel.down.len());
        }
    }

    if let Some(dir) = config_dir.filter(|dir| paths::has_dir_prefix(path, dir)) {
        let depth = paths::depth_below(path, dir);
        return PathScore::new(2, depth, depth);
    }

    if let Some(dir) = exec_dir.filter(|dir| paths::has_dir_prefix(path, dir)) {
        let depth = paths::depth_below(path, dir);
        return PathScore::new(3, depth, depth);
    }

    PathScore::UNRELATED
}

/// True if `down` is exactly the segments of one of the patterns.
fn matches_ancestor_pattern(down: &[String], patterns: &[String]) -> bool {
    if down.is_empty() {
        return false;
    }
    patterns.iter().any(|pattern| {
        let segments = paths::pattern_segments(pattern);
        segments.len() == down.len()
            && segments.iter().zip(down).all(|(p, d)| segment_eq(p, d))
    })
}
