use anyhow::Result;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use super::goal::Goal;
use super::loader::{find_goal_files, load_goal_from_file, validate};
use super::prompt_file::{find_prompt_files, load_prompt_file, prompt_file_to_goal};
use crate::discovery::{Discoverer, ResourceKind};
use crate::error::RegistryError;

/// Read access to the available goals.
pub trait GoalRegistry {
    /// Goal names in sorted order.
    fn list(&self) -> &[String];

    fn get(&self, name: &str) -> Result<&Goal, RegistryError>;

    /// Every goal, sorted by name.
    fn all_goals(&self) -> Vec<Goal>;

    /// Re-run discovery and rebuild the registry.
    fn reload(&mut self) -> Result<()>;
}

#[derive(Debug, Default)]
struct RegistryState {
    discovered: HashMap<String, Goal>,
    merged: HashMap<String, Goal>,
    ordered_names: Vec<String>,
}

impl RegistryState {
    /// Overlay `discovered` on `builtins`; a discovered goal always replaces
    /// a built-in of the same name.
    fn build(builtins: &[Goal], discovered: HashMap<String, Goal>) -> Self {
        let mut merged: HashMap<String, Goal> = builtins
            .iter()
            .map(|goal| (goal.name.clone(), goal.clone()))
            .collect();
        for (name, goal) in &discovered {
            merged.insert(name.clone(), goal.clone());
        }

        let mut ordered_names: Vec<String> = merged.keys().cloned().collect();
        ordered_names.sort();

        Self {
            discovered,
            merged,
            ordered_names,
        }
    }
}

/// Built-in goals overlaid with goals discovered on disk.
///
/// `reload` takes `&mut self`, so lookups can never observe a half-built
/// state. Wrap the registry in a lock to share it across threads.
#[derive(Debug)]
pub struct DynamicGoalRegistry {
    builtins: Vec<Goal>,
    discoverer: Discoverer,
    state: RegistryState,
}

impl DynamicGoalRegistry {
    /// Create the registry and perform the initial load.
    pub fn new(builtins: Vec<Goal>, discoverer: Discoverer) -> Self {
        let mut registry = Self {
            builtins,
            discoverer,
            state: RegistryState::default(),
        };

        if let Err(e) = registry.reload() {
            warn!("failed to load discovered goals: {:#}", e);
        }

        registry
    }

    pub fn discoverer(&self) -> &Discoverer {
        &self.discoverer
    }

    /// Number of goals that came from disk rather than the built-ins.
    pub fn discovered_count(&self) -> usize {
        self.state.discovered.len()
    }
}

impl GoalRegistry for DynamicGoalRegistry {
    fn list(&self) -> &[String] {
        &self.state.ordered_names
    }

    fn get(&self, name: &str) -> Result<&Goal, RegistryError> {
        self.state
            .merged
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    fn all_goals(&self) -> Vec<Goal> {
        self.state
            .ordered_names
            .iter()
            .filter_map(|name| self.state.merged.get(name))
            .cloned()
            .collect()
    }

    fn reload(&mut self) -> Result<()> {
        let mut discovered = HashMap::new();

        // Paths arrive best-first, so the first goal seen under a name wins.
        for dir in self.discoverer.discover_paths() {
            load_goal_files(&dir, &mut discovered);
            load_prompt_files(&dir, &mut discovered);
        }

        if self.discoverer.kind() == ResourceKind::Goal {
            for dir in self.discoverer.discover_prompt_file_paths() {
                load_prompt_files(&dir, &mut discovered);
            }
        }

        debug!("discovered {} goals", discovered.len());
        self.state = RegistryState::build(&self.builtins, discovered);
        Ok(())
    }
}

fn insert_first(discovered: &mut HashMap<String, Goal>, goal: Goal) {
    match discovered.entry(goal.name.clone()) {
        Entry::Occupied(existing) => debug!(
            "goal {} from {} shadowed by {}",
            goal.name,
            goal.source,
            existing.get().source
        ),
        Entry::Vacant(slot) => {
            slot.insert(goal);
        }
    }
}

fn load_goal_files(dir: &Path, discovered: &mut HashMap<String, Goal>) {
    let candidates = match find_goal_files(dir) {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!("failed to scan goal directory {}: {:#}", dir.display(), e);
            return;
        }
    };

    for candidate in candidates {
        match load_goal_from_file(&candidate.path) {
            Ok(goal) => insert_first(discovered, goal),
            Err(e) => warn!("failed to load goal from {}: {}", candidate.path.display(), e),
        }
    }
}

fn load_prompt_files(dir: &Path, discovered: &mut HashMap<String, Goal>) {
    let candidates = match find_prompt_files(dir) {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!("failed to scan prompt files in {}: {:#}", dir.display(), e);
            return;
        }
    };

    for candidate in candidates {
        let goal = match load_prompt_file(&candidate.path) {
            Ok(prompt) => prompt_file_to_goal(&prompt),
            Err(e) => {
                warn!("failed to load prompt file {}: {}", candidate.path.display(), e);
                continue;
            }
        };
        match validate(&goal, &candidate.path) {
            Ok(()) => insert_first(discovered, goal),
            Err(e) => warn!("failed to load prompt file {}: {}", candidate.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{Anchors, DiscoveryConfig};
    use crate::goals::{builtin_goals, GoalSource};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn discoverer(cwd: &Path, paths: &[PathBuf]) -> Discoverer {
        let mut config = DiscoveryConfig::new(ResourceKind::Goal);
        config.autodiscovery = false;
        config.disable_standard_paths = true;
        config.custom_paths = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        Discoverer::with_anchors(
            config,
            Anchors {
                cwd: Some(cwd.to_path_buf()),
                ..Default::default()
            },
        )
    }

    fn write_goal(dir: &Path, file: &str, name: &str, description: &str) {
        fs::create_dir_all(dir).unwrap();
        let body = serde_json::json!({ "Name": name, "Description": description });
        fs::write(dir.join(file), body.to_string()).unwrap();
    }

    fn review_builtin() -> Goal {
        Goal {
            name: "review".into(),
            description: "builtin".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_builtins_only() {
        let temp = TempDir::new().unwrap();
        let registry = DynamicGoalRegistry::new(builtin_goals(), discoverer(temp.path(), &[]));

        assert_eq!(
            registry.list(),
            ["comment-stripper", "commit-message", "doc-generator", "test-generator"]
        );
        assert_eq!(registry.discovered_count(), 0);
        assert_eq!(
            registry.get("nope").unwrap_err(),
            RegistryError::NotFound("nope".to_string())
        );
    }

    #[test]
    fn test_discovered_overrides_builtin() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("goals");
        write_goal(&dir, "review.json", "review", "custom");

        let registry =
            DynamicGoalRegistry::new(vec![review_builtin()], discoverer(temp.path(), &[dir]));

        let goal = registry.get("review").unwrap();
        assert_eq!(goal.description, "custom");
        assert!(matches!(goal.source, GoalSource::File(_)));
    }

    #[test]
    fn test_invalid_name_excluded() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("goals");
        write_goal(&dir, "bad.json", "bad name", "has a space");
        write_goal(&dir, "good.json", "good", "fine");

        let registry = DynamicGoalRegistry::new(Vec::new(), discoverer(temp.path(), &[dir]));

        assert_eq!(registry.list(), ["good"]);
        assert!(matches!(registry.get("bad name"), Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_higher_priority_path_wins() {
        let temp = TempDir::new().unwrap();
        let near = temp.path().join("near");
        let far = temp.path().join("x/far");
        write_goal(&near, "a.json", "shared", "near");
        write_goal(&far, "a.json", "shared", "far");

        // Declared far-first; ranking, not declaration order, decides.
        let registry =
            DynamicGoalRegistry::new(Vec::new(), discoverer(temp.path(), &[far, near]));

        assert_eq!(registry.get("shared").unwrap().description, "near");
    }

    #[test]
    fn test_first_file_in_directory_wins() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("goals");
        write_goal(&dir, "b.json", "dup", "from b");
        write_goal(&dir, "a.json", "dup", "from a");

        let registry = DynamicGoalRegistry::new(Vec::new(), discoverer(temp.path(), &[dir]));
        assert_eq!(registry.get("dup").unwrap().description, "from a");
    }

    #[test]
    fn test_prompt_files_loaded_and_validated() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("goals");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("explain.prompt.md"), "Explain the code").unwrap();
        fs::write(dir.join("bad.prompt.md"), "---\nname: has space\n---\nx").unwrap();

        let registry = DynamicGoalRegistry::new(Vec::new(), discoverer(temp.path(), &[dir]));

        assert_eq!(registry.list(), ["explain"]);
        assert_eq!(registry.get("explain").unwrap().category, "prompt-file");
    }

    #[test]
    fn test_json_beats_prompt_file_in_same_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("goals");
        write_goal(&dir, "review.json", "review", "json");
        fs::write(dir.join("review.prompt.md"), "prompt body").unwrap();

        let registry = DynamicGoalRegistry::new(Vec::new(), discoverer(temp.path(), &[dir]));
        assert_eq!(registry.get("review").unwrap().description, "json");
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("goals");
        fs::create_dir_all(&dir).unwrap();

        let mut registry =
            DynamicGoalRegistry::new(Vec::new(), discoverer(temp.path(), &[dir.clone()]));
        assert!(registry.list().is_empty());

        write_goal(&dir, "new.json", "new-goal", "added later");
        registry.reload().unwrap();

        assert_eq!(registry.list(), ["new-goal"]);
        let all = registry.all_goals();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].description, "added later");
    }
}
