//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/stockavl/stockavl.toml`
//! 3. Local config: `<config_dir>/.stockavl.toml`
//! 4. Environment variables: `STOCKAVL_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::DuplicatePolicy;
use crate::application::ApplicationError;

const APP_NAME: &str = "stockavl";
const GLOBAL_CONFIG_FILE: &str = "stockavl.toml";
const LOCAL_CONFIG_FILE: &str = ".stockavl.toml";
const DATA_FILE_NAME: &str = "inventory.json";

/// Unified configuration for stockavl.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Snapshot file holding the inventory
    pub data_file: PathBuf,
    /// How duplicate ids in snapshot data are handled
    pub on_duplicate: DuplicatePolicy,
    /// Save the snapshot after a command changed the inventory
    pub autosave: bool,
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub on_duplicate: Option<DuplicatePolicy>,
    pub autosave: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            on_duplicate: DuplicatePolicy::default(),
            autosave: true,
        }
    }
}

/// Default snapshot location (`$XDG_DATA_HOME/stockavl/inventory.json`).
fn default_data_file() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().join(DATA_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DATA_FILE_NAME))
}

/// Get the XDG config directory for stockavl.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(LOCAL_CONFIG_FILE)
}

/// Directory searched for the local config: `config_dir` or the current directory.
pub fn local_config_dir(config_dir: Option<&Path>) -> &Path {
    config_dir.unwrap_or_else(|| Path::new("."))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand `~`, `$VAR` and `${VAR}` in the data file path.
    fn expand_paths(&mut self) {
        let raw = self.data_file.to_string_lossy().into_owned();
        if let Ok(expanded) = shellexpand::full(&raw) {
            self.data_file = PathBuf::from(expanded.into_owned());
        }
    }

    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_file: overlay
                .data_file
                .clone()
                .unwrap_or_else(|| self.data_file.clone()),
            on_duplicate: overlay.on_duplicate.unwrap_or(self.on_duplicate),
            autosave: overlay.autosave.unwrap_or(self.autosave),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_dir` - Directory holding a local `.stockavl.toml`
    ///   (defaults to the current directory)
    ///
    /// A relative `data_file` in the local config is resolved against
    /// that directory.
    pub fn load(config_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        let dir = local_config_dir(config_dir);
        let local_path = local_config_path(dir);
        if local_path.exists() {
            let mut raw = load_raw_settings(&local_path)?;
            raw.data_file = raw.data_file.map(|p| resolve_against(dir, p));
            current = current.merge_with(&raw);
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply STOCKAVL_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("STOCKAVL").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get::<DuplicatePolicy>("on_duplicate") {
            settings.on_duplicate = val;
        }
        if let Ok(val) = config.get_bool("autosave") {
            settings.autosave = val;
        }

        Ok(settings)
    }

    /// Replace the data file, expanding it like a configured one.
    pub fn with_data_file(mut self, data_file: impl Into<PathBuf>) -> Self {
        self.data_file = data_file.into();
        self.expand_paths();
        self
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# stockavl configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/stockavl/stockavl.toml
#   Local:  <dir>/.stockavl.toml  (selected with -C <dir>)
#   Env:    STOCKAVL_* environment variables

# Snapshot file holding the inventory (~ and $VAR are expanded)
# data_file = "~/.local/share/stockavl/inventory.json"

# Duplicate ids in snapshot data: "skip" (keep first, warn) or "abort"
# on_duplicate = "skip"

# Save the snapshot after add/remove/import
# autosave = true
"#
        .to_string()
    }
}

fn resolve_against(dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() && !path.starts_with("~") && !path.to_string_lossy().starts_with('$') {
        dir.join(path)
    } else {
        path
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::default();
        assert!(settings.data_file.ends_with(DATA_FILE_NAME));
        assert_eq!(settings.on_duplicate, DuplicatePolicy::Skip);
        assert!(settings.autosave);
    }

    #[test]
    fn given_tilde_in_data_file_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_file: PathBuf::from("~/stock/inventory.json"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let expanded = settings.data_file.to_string_lossy();
        assert!(
            expanded.starts_with(&home),
            "data_file should start with home dir: {}",
            expanded
        );
        assert!(!expanded.contains('~'));
    }

    #[test]
    fn given_data_file_override_when_applied_then_expanded_like_config() {
        std::env::var("HOME").expect("HOME should be set");

        let settings = Settings::default().with_data_file("$HOME/stock/inventory.json");

        let expanded = settings.data_file.to_string_lossy();
        assert!(!expanded.contains('$'), "override not expanded: {}", expanded);
        assert!(expanded.ends_with("stock/inventory.json"));
    }

    #[test]
    fn given_no_config_dir_when_locating_local_config_then_uses_cwd() {
        assert_eq!(local_config_dir(None), Path::new("."));
        assert_eq!(
            local_config_dir(Some(Path::new("/srv/shop"))),
            Path::new("/srv/shop")
        );
    }

    #[test]
    fn given_partial_overlay_when_merging_then_keeps_unspecified_fields() {
        let base = Settings {
            data_file: PathBuf::from("/base.json"),
            on_duplicate: DuplicatePolicy::Skip,
            autosave: true,
        };
        let overlay = RawSettings {
            data_file: None,
            on_duplicate: Some(DuplicatePolicy::Abort),
            autosave: None,
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.data_file, PathBuf::from("/base.json"));
        assert_eq!(merged.on_duplicate, DuplicatePolicy::Abort);
        assert!(merged.autosave);
    }

    #[test]
    fn given_relative_path_when_resolving_then_joins_config_dir() {
        let dir = Path::new("/projects/shop");
        assert_eq!(
            resolve_against(dir, PathBuf::from("data/inv.json")),
            PathBuf::from("/projects/shop/data/inv.json")
        );
        assert_eq!(
            resolve_against(dir, PathBuf::from("/abs/inv.json")),
            PathBuf::from("/abs/inv.json")
        );
        assert_eq!(
            resolve_against(dir, PathBuf::from("~/inv.json")),
            PathBuf::from("~/inv.json")
        );
    }

    #[test]
    fn given_default_settings_when_serialized_then_lists_all_keys() {
        let toml = Settings::default().to_toml().unwrap();
        assert!(toml.contains("data_file"));
        assert!(toml.contains("on_duplicate = \"skip\""));
        assert!(toml.contains("autosave = true"));
    }
}
