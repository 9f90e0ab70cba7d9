//! Configuration management for osm.
//!
//! Settings come from a TOML file (by default `~/.one-shot-man/config`,
//! overridable with `OSM_CONFIG`) layered under `OSM_`-prefixed environment
//! variables. Consumers read them through the string-keyed [`OptionSource`]
//! trait, so discovery code never depends on where a value came from.

mod parse;

pub use parse::{parse_bool, parse_path_list, parse_positive_int};

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "OSM_CONFIG";

/// Directory under the home directory holding the default config file.
const CONFIG_DIR_NAME: &str = ".one-shot-man";

/// File name of the default config file.
const CONFIG_FILE_NAME: &str = "config";

/// A generic string-keyed option lookup.
///
/// Keys are dotted, e.g. `goal.max-traversal-depth`.
pub trait OptionSource {
    /// Returns the raw value for `key`, or `None` if it is not set.
    fn option(&self, key: &str) -> Option<String>;
}

impl OptionSource for HashMap<String, String> {
    fn option(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: OptionSource + ?Sized> OptionSource for &T {
    fn option(&self, key: &str) -> Option<String> {
        (**self).option(key)
    }
}

/// Resolve the config file path.
///
/// `OSM_CONFIG` wins when set to a non-empty value; otherwise the file lives
/// at `~/.one-shot-man/config`.
pub fn config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// The directory holding the config file; the "user configuration directory".
pub fn config_dir() -> Result<PathBuf> {
    let path = config_path()?;
    path.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("Config path {} has no parent directory", path.display()))
}

/// Loaded application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    inner: config::Config,
    path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the default config path plus the environment.
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        Self::load_from(&path)
    }

    /// Load settings from `path` plus the environment.
    ///
    /// A missing file yields empty settings rather than an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading settings from {}", path.display());

        let inner = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix("OSM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Ok(Self {
            inner,
            path: Some(path.to_path_buf()),
        })
    }

    /// Settings with no values at all.
    pub fn empty() -> Self {
        Self {
            inner: config::Config::default(),
            path: None,
        }
    }

    /// The file these settings were loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        if let Ok(value) = self.inner.get_string(key) {
            return Some(value);
        }

        // Lists are flattened into the same comma-separated form the
        // path-list parser accepts.
        let values = self.inner.get_array(key).ok()?;
        let items: Vec<String> = values
            .into_iter()
            .filter_map(|v| v.into_string().ok())
            .collect();
        Some(items.join(","))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::empty()
    }
}

impl OptionSource for Settings {
    fn option(&self, key: &str) -> Option<String> {
        if let Some(value) = self.lookup(key) {
            return Some(value);
        }

        // Environment variables cannot carry hyphens, so
        // OSM_GOAL__MAX_TRAVERSAL_DEPTH lands as goal.max_traversal_depth.
        let underscored = key.replace('-', "_");
        if underscored != key {
            return self.lookup(&underscored);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hashmap_option_source() {
        let mut map = HashMap::new();
        map.insert("goal.paths".to_string(), "/a,/b".to_string());

        assert_eq!(map.option("goal.paths"), Some("/a,/b".to_string()));
        assert_eq!(map.option("goal.autodiscovery"), None);
    }

    #[test]
    #[serial]
    fn test_config_path_env_override() {
        std::env::set_var(CONFIG_PATH_ENV, "/custom/osm/config");
        let path = config_path().unwrap();
        std::env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(path, PathBuf::from("/custom/osm/config"));
    }

    #[test]
    #[serial]
    fn test_config_dir_is_parent_of_config_path() {
        std::env::set_var(CONFIG_PATH_ENV, "/custom/osm/config");
        let dir = config_dir().unwrap();
        std::env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(dir, PathBuf::from("/custom/osm"));
    }

    #[test]
    #[serial]
    fn test_config_path_default_location() {
        std::env::remove_var(CONFIG_PATH_ENV);
        let path = config_path().unwrap();

        assert!(path.ends_with(".one-shot-man/config"));
    }

    #[test]
    #[serial]
    fn test_load_from_toml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config");
        fs::write(
            &path,
            "[goal]\nautodiscovery = false\nmax-traversal-depth = 5\npaths = [\"/one\", \"/two\"]\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.option("goal.autodiscovery"), Some("false".to_string()));
        assert_eq!(settings.option("goal.max-traversal-depth"), Some("5".to_string()));
        assert_eq!(settings.option("goal.paths"), Some("/one,/two".to_string()));
        assert_eq!(settings.option("goal.path-patterns"), None);
        assert_eq!(settings.path(), Some(path.as_path()));
    }

    #[test]
    #[serial]
    fn test_missing_file_yields_empty_settings() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load_from(&temp.path().join("does-not-exist")).unwrap();

        assert_eq!(settings.option("goal.autodiscovery"), None);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config");
        fs::write(&path, "[script]\nautodiscovery = false\n").unwrap();

        std::env::set_var("OSM_SCRIPT__AUTODISCOVERY", "true");
        std::env::set_var("OSM_SCRIPT__MAX_TRAVERSAL_DEPTH", "7");
        let settings = Settings::load_from(&path);
        std::env::remove_var("OSM_SCRIPT__AUTODISCOVERY");
        std::env::remove_var("OSM_SCRIPT__MAX_TRAVERSAL_DEPTH");

        let settings = settings.unwrap();
        assert_eq!(settings.option("script.autodiscovery"), Some("true".to_string()));
        assert_eq!(settings.option("script.max-traversal-depth"), Some("7".to_string()));
    }

    #[test]
    fn test_empty_settings() {
        let settings = Settings::empty();
        assert!(settings.path().is_none());
        assert_eq!(settings.option("goal.paths"), None);
    }
}
