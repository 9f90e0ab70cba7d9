//! Resource directory discovery.
//!
//! Goal and script directories are collected from three sources:
//! 1. Standard paths: `<config dir>/<pattern>`, `<exe dir>/<pattern>`,
//!    `<cwd>/<pattern>` using the primary name pattern
//! 2. Custom paths from the `<kind>.paths` option (`~` and `$VAR` expanded)
//! 3. Autodiscovery: every `<ancestor>/<pattern>` directory found while
//!    walking up from the working directory
//!
//! Every candidate is normalized (absolute, symlinks resolved, checked not
//! to escape its parent), deduplicated by resolved path, and sorted
//! nearest-first:
//!
//! ```text
//! class 0  inside the working directory
//! class 1  <ancestor>/<pattern> above the working directory
//! class 2  inside the user config directory
//! class 3  inside the executable's directory
//! class 4  anything else
//! ```
//!
//! Ties break on distance, then depth, then the path string, so the order
//! never depends on the order candidates were found in.

mod config;
mod discoverer;
mod normalize;
mod paths;
mod score;
mod traverse;

pub use config::{
    DebugSink, DiscoveryConfig, ResourceKind, DEFAULT_MAX_TRAVERSAL_DEPTH,
    MAX_TRAVERSAL_DEPTH_CEILING,
};
pub use discoverer::{Anchors, Discoverer, PROMPT_FILE_DIR};
pub use normalize::{expand_path, normalize, NormalizedPath, PathCandidate};
pub use score::{score, PathScore, INFINITE};
pub use traverse::traverse_upward;
