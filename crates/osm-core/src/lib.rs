//! Core engine for osm: resource discovery and the goal registry.
//!
//! Goal and script definitions live in many places: next to the
//! executable, in the user's config directory, in the current project and
//! in any ancestor directory. [`discovery`] finds those directories and
//! ranks them nearest-first; [`goals`] loads definitions from them and
//! overlays the result on the built-in goals.

pub mod discovery;
pub mod error;
pub mod goals;

pub use discovery::{DebugSink, DiscoveryConfig, Discoverer, ResourceKind};
pub use error::{GoalLoadError, NormalizeError, RegistryError};
pub use goals::{builtin_goals, DynamicGoalRegistry, Goal, GoalRegistry};
