use file_sorter_core::{CategoryError, CategoryRegistry, EnabledCategories};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::organizer::ConflictPolicy;

const APP_DIR: &str = "file-sorter";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory organized when none is given on the command line.
    pub root: PathBuf,
    /// Categories switched on. Unlisted categories fall back to "Others".
    pub enabled: Vec<String>,
    pub conflict: ConflictPolicy,
    pub watch_debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            enabled: CategoryRegistry::builtin()
                .names()
                .map(String::from)
                .collect(),
            conflict: ConflictPolicy::default(),
            watch_debounce_ms: 2000,
        }
    }
}

impl Config {
    /// `<config dir>/file-sorter/config.json`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(Into::into)
    }

    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(Into::into)
    }

    pub fn enabled_categories(
        &self,
        registry: &CategoryRegistry,
    ) -> Result<EnabledCategories, CategoryError> {
        EnabledCategories::from_names(registry, &self.enabled)
    }
}

fn default_root() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}
