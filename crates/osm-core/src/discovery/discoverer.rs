use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::config::{trace, DebugSink, DiscoveryConfig, ResourceKind};
use super::normalize::{normalize, NormalizedPath, PathCandidate};
use super::score::{score, PathScore};
use super::traverse::traverse_upward;

/// Project-local directory scanned for `.prompt.md` files.
pub const PROMPT_FILE_DIR: &str = ".github/prompts";

/// The three directories paths are ranked against.
///
/// Any of them may be unavailable; a missing anchor never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchors {
    pub cwd: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub exec_dir: Option<PathBuf>,
}

impl Anchors {
    /// Anchors of the running process.
    pub fn from_process() -> Self {
        let cwd = match std::env::current_dir() {
            Ok(cwd) => Some(cwd),
            Err(e) => {
                warn!("cannot determine working directory: {}", e);
                None
            }
        };
        let config_dir = match osm_config::config_dir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                debug!("config directory unavailable: {}", e);
                None
            }
        };
        let exec_dir = match std::env::current_exe() {
            Ok(exe) => exe.parent().map(Path::to_path_buf),
            Err(e) => {
                debug!("executable path unavailable: {}", e);
                None
            }
        };

        Self {
            cwd,
            config_dir,
            exec_dir,
        }
    }

    /// Anchors with symlinks resolved where possible, so they compare
    /// against normalized paths.
    fn resolved(&self) -> Self {
        let resolve = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| fs::canonicalize(p).unwrap_or_else(|_| p.clone()))
        };
        Self {
            cwd: resolve(&self.cwd),
            config_dir: resolve(&self.config_dir),
            exec_dir: resolve(&self.exec_dir),
        }
    }
}

/// Finds and ranks resource directories for one [`ResourceKind`].
#[derive(Debug, Clone)]
pub struct Discoverer {
    config: DiscoveryConfig,
    anchors: Option<Anchors>,
}

impl Discoverer {
    /// A discoverer anchored to the running process.
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            anchors: None,
        }
    }

    /// A discoverer with fixed anchors instead of the process's own.
    pub fn with_anchors(config: DiscoveryConfig, anchors: Anchors) -> Self {
        Self {
            config,
            anchors: Some(anchors),
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn kind(&self) -> ResourceKind {
        self.config.kind
    }

    fn anchors(&self) -> Anchors {
        self.anchors.clone().unwrap_or_else(Anchors::from_process)
    }

    fn sink(&self) -> Option<&DebugSink> {
        self.config.debug_sink.as_ref()
    }

    /// Every resource directory, deduplicated and sorted nearest-first.
    ///
    /// Never fails; rejected candidates are logged and dropped.
    pub fn discover_paths(&self) -> Vec<PathBuf> {
        let config = &self.config;
        let sink = self.sink();
        let anchors = self.anchors();

        trace(
            sink,
            format_args!(
                "starting path discovery (autodiscovery={}, standardPaths={}, patterns={:?}, maxDepth={})",
                config.autodiscovery,
                !config.disable_standard_paths,
                config.name_patterns,
                config.effective_depth()
            ),
        );

        let mut collector = Collector::new(self.kind(), anchors.cwd.as_deref(), sink);

        for candidate in self.standard_candidates(&anchors) {
            collector.add(candidate);
        }

        for raw in &config.custom_paths {
            collector.add(PathCandidate::Custom(raw.clone()));
        }

        if config.autodiscovery {
            match anchors.cwd.as_deref() {
                Some(cwd) => {
                    trace(
                        sink,
                        format_args!("autodiscover: starting upward traversal from {}", cwd.display()),
                    );
                    let found =
                        traverse_upward(cwd, config.effective_depth(), &config.name_patterns, sink);
                    for path in found {
                        collector.add(PathCandidate::Discovered(path));
                    }
                }
                None => trace(sink, format_args!("autodiscover: skipped (no working directory)")),
            }
        }

        let paths = collector.finish(&anchors.resolved(), &config.name_patterns);

        trace(sink, format_args!("discovery complete: {} paths found", paths.len()));
        for (i, p) in paths.iter().enumerate() {
            trace(sink, format_args!("  [{}] {}", i, p.display()));
        }

        paths
    }

    /// Directories scanned for `.prompt.md` files only: the project's
    /// `.github/prompts` plus `prompt_file_paths`, ranked like
    /// [`discover_paths`](Self::discover_paths).
    pub fn discover_prompt_file_paths(&self) -> Vec<PathBuf> {
        let config = &self.config;
        let sink = self.sink();
        let anchors = self.anchors();
        let mut collector = Collector::new(self.kind(), anchors.cwd.as_deref(), sink);

        if !config.disable_standard_paths {
            if let Some(cwd) = anchors.cwd.as_deref() {
                collector.add(PathCandidate::Standard(cwd.join(PROMPT_FILE_DIR)));
            }
        }

        for raw in &config.prompt_file_paths {
            collector.add(PathCandidate::Custom(raw.clone()));
        }

        collector.finish(&anchors.resolved(), &config.name_patterns)
    }

    fn standard_candidates(&self, anchors: &Anchors) -> Vec<PathCandidate> {
        let sink = self.sink();
        if self.config.disable_standard_paths {
            trace(sink, format_args!("standard paths disabled by configuration"));
            return Vec::new();
        }

        let Some(pattern) = self.config.primary_pattern() else {
            trace(sink, format_args!("standard paths skipped (no name patterns)"));
            return Vec::new();
        };

        let sources = [
            ("config", &anchors.config_dir),
            ("exec", &anchors.exec_dir),
            ("cwd", &anchors.cwd),
        ];

        let mut candidates = Vec::new();
        for (label, dir) in sources {
            match dir {
                Some(dir) => {
                    let path = dir.join(pattern);
                    trace(sink, format_args!("standard path [{}]: {}", label, path.display()));
                    candidates.push(PathCandidate::Standard(path));
                }
                None => trace(
                    sink,
                    format_args!("standard path [{}]: skipped (unavailable)", label),
                ),
            }
        }
        candidates
    }
}

/// Normalizes and deduplicates candidates as they arrive.
struct Collector<'a> {
    kind: ResourceKind,
    cwd: Option<&'a Path>,
    sink: Option<&'a DebugSink>,
    seen: HashSet<NormalizedPath>,
    accepted: Vec<NormalizedPath>,
}

impl<'a> Collector<'a> {
    fn new(kind: ResourceKind, cwd: Option<&'a Path>, sink: Option<&'a DebugSink>) -> Self {
        Self {
            kind,
            cwd,
            sink,
            seen: HashSet::new(),
            accepted: Vec::new(),
        }
    }

    fn add(&mut self, candidate: PathCandidate) {
        trace(
            self.sink,
            format_args!("adding {} path candidate: {}", candidate.origin(), candidate),
        );

        match normalize(&candidate, self.cwd) {
            Ok(None) => trace(self.sink, format_args!("addPath: skipping empty candidate")),
            Ok(Some(normalized)) => {
                if self.seen.contains(&normalized) {
                    trace(
                        self.sink,
                        format_args!("addPath: deduplicating {} (normalized: {})", candidate, normalized),
                    );
                    return;
                }
                trace(
                    self.sink,
                    format_args!("addPath: accepted {} (normalized: {})", candidate, normalized),
                );
                self.seen.insert(normalized.clone());
                self.accepted.push(normalized);
            }
            Err(e) => {
                warn!(
                    "skipping {} path {}: {}",
                    self.kind.option_prefix(),
                    candidate,
                    e
                );
                trace(
                    self.sink,
                    format_args!("addPath: normalization failed for {:?}: {}", candidate.to_string(), e),
                );
            }
        }
    }

    /// Sort by score against the resolved anchors, then by path.
    fn finish(self, anchors: &Anchors, patterns: &[String]) -> Vec<PathBuf> {
        let mut ranked: Vec<(PathScore, NormalizedPath)> = self
            .accepted
            .into_iter()
            .map(|path| {
                let s = score(
                    path.as_path(),
                    anchors.cwd.as_deref(),
                    anchors.config_dir.as_deref(),
                    anchors.exec_dir.as_deref(),
                    patterns,
                );
                (s, path)
            })
            .collect();
        ranked.sort();
        ranked.into_iter().map(|(_, p)| p.into_path_buf()).collect()
    }
}
