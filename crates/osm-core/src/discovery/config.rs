//! Discovery configuration, built once from the option source.

use osm_config::{parse_bool, parse_path_list, parse_positive_int, OptionSource};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Default number of directories walked upward during autodiscovery.
pub const DEFAULT_MAX_TRAVERSAL_DEPTH: usize = 10;

/// Hard ceiling on `max-traversal-depth`.
pub const MAX_TRAVERSAL_DEPTH_CEILING: usize = 100;

/// Which kind of resource directory is being discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Goal (workflow) definitions.
    Goal,
    /// Helper scripts.
    Script,
}

impl ResourceKind {
    /// Prefix of this kind's option keys, e.g. `goal` in `goal.paths`.
    pub fn option_prefix(self) -> &'static str {
        match self {
            ResourceKind::Goal => "goal",
            ResourceKind::Script => "script",
        }
    }

    /// Label prefixed to debug trace lines.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Goal => "goal-discovery",
            ResourceKind::Script => "script-discovery",
        }
    }

    fn default_autodiscovery(self) -> bool {
        matches!(self, ResourceKind::Goal)
    }

    fn default_patterns(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Goal => &["osm-goals", "goals"],
            ResourceKind::Script => &["scripts"],
        }
    }

    fn disable_autodiscovery_env(self) -> &'static str {
        match self {
            ResourceKind::Goal => "OSM_DISABLE_GOAL_AUTODISCOVERY",
            ResourceKind::Script => "OSM_DISABLE_SCRIPT_AUTODISCOVERY",
        }
    }
}

/// Write-only channel for discovery trace lines.
///
/// Whether a sink is installed never changes what discovery returns.
#[derive(Clone)]
pub struct DebugSink(Arc<dyn Fn(&str) + Send + Sync>);

impl DebugSink {
    pub fn new(f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// A sink that forwards every line to `tracing` under `osm::discovery`.
    pub fn tracing(kind: ResourceKind) -> Self {
        let label = kind.label();
        Self::new(move |line| info!(target: "osm::discovery", "[{}] {}", label, line))
    }

    pub fn emit(&self, line: &str) {
        (self.0)(line)
    }
}

impl fmt::Debug for DebugSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DebugSink")
    }
}

/// Emit a formatted trace line if a sink is installed.
pub(crate) fn trace(sink: Option<&DebugSink>, args: fmt::Arguments<'_>) {
    if let Some(sink) = sink {
        sink.emit(&args.to_string());
    }
}

/// Settings that drive one kind of discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub kind: ResourceKind,
    /// Walk upward from the working directory looking for pattern dirs.
    pub autodiscovery: bool,
    /// Skip the config-dir, exe-dir and cwd standard candidates.
    pub disable_standard_paths: bool,
    /// User-declared directories, unexpanded.
    pub custom_paths: Vec<String>,
    pub max_traversal_depth: usize,
    /// Directory names to look for; the first is the primary pattern.
    pub name_patterns: Vec<String>,
    /// Extra directories scanned for `.prompt.md` files only (goals).
    pub prompt_file_paths: Vec<String>,
    pub debug_sink: Option<DebugSink>,
}

impl DiscoveryConfig {
    /// Defaults for `kind`, ignoring any configuration.
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            autodiscovery: kind.default_autodiscovery(),
            disable_standard_paths: false,
            custom_paths: Vec::new(),
            max_traversal_depth: DEFAULT_MAX_TRAVERSAL_DEPTH,
            name_patterns: kind
                .default_patterns()
                .iter()
                .map(|p| p.to_string())
                .collect(),
            prompt_file_paths: Vec::new(),
            debug_sink: None,
        }
    }

    /// Build the config for `kind` from `<kind>.*` options plus the
    /// environment override.
    ///
    /// Malformed values are logged and replaced by the default.
    pub fn from_options(kind: ResourceKind, options: &dyn OptionSource) -> Self {
        let mut config = Self::new(kind);
        let key = |name: &str| format!("{}.{}", kind.option_prefix(), name);

        if let Some(v) = bool_option(options, &key("autodiscovery")) {
            config.autodiscovery = v;
        }

        if let Some(v) = bool_option(options, &key("disable-standard-paths")) {
            config.disable_standard_paths = v;
        }

        if let Some(raw) = options.option(&key("max-traversal-depth")) {
            config.max_traversal_depth = parse_positive_int(
                &raw,
                DEFAULT_MAX_TRAVERSAL_DEPTH,
                MAX_TRAVERSAL_DEPTH_CEILING,
            );
        }

        if let Some(raw) = options.option(&key("paths")) {
            config.custom_paths = parse_path_list(&raw);
        }

        if let Some(raw) = options.option(&key("path-patterns")) {
            let patterns = parse_path_list(&raw);
            if !patterns.is_empty() {
                config.name_patterns = patterns;
            }
        }

        if kind == ResourceKind::Goal {
            if let Some(raw) = options.option(&key("prompt-file-paths")) {
                config.prompt_file_paths = parse_path_list(&raw);
            }
        }

        if bool_option(options, &key("debug-discovery")).unwrap_or(false) {
            config.debug_sink = Some(DebugSink::tracing(kind));
        }

        // Environment override, mostly for tests and CI.
        if let Ok(raw) = std::env::var(kind.disable_autodiscovery_env()) {
            if parse_bool(&raw).unwrap_or(false) {
                config.autodiscovery = false;
            }
        }

        config
    }

    pub fn with_debug_sink(mut self, sink: DebugSink) -> Self {
        self.debug_sink = Some(sink);
        self
    }

    /// The pattern used for standard candidates.
    pub fn primary_pattern(&self) -> Option<&str> {
        self.name_patterns.first().map(String::as_str)
    }

    /// Traversal depth clamped into `1..=MAX_TRAVERSAL_DEPTH_CEILING`.
    pub fn effective_depth(&self) -> usize {
        self.max_traversal_depth.clamp(1, MAX_TRAVERSAL_DEPTH_CEILING)
    }
}

fn bool_option(options: &dyn OptionSource, key: &str) -> Option<bool> {
    let raw = options.option(key)?;
    let parsed = parse_bool(&raw);
    if parsed.is_none() {
        warn!("invalid boolean {:?} for {}, using default", raw, key);
    }
    parsed
}
