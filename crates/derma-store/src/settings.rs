//! Data directory layout and user settings.
//!
//! Layout:
//! ```text
//! ~/.derma/
//! ├── derma.db
//! └── config.toml
//! ```

use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};

use derma_core::{SkinType, UserProfile};

use crate::error::{Result, StoreError};
use crate::store::Store;

pub const DATA_DIR_ENV: &str = "DERMA_DATA_DIR";
pub const DB_FILE: &str = "derma.db";
pub const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

fn default_base_dir() -> PathBuf {
    dirs_home().join(".derma")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Explicit path, then `DERMA_DATA_DIR`, then `~/.derma`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => default_base_dir(),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub profile: ProfileSettings,
    pub assistant: AssistantSettings,
    pub scan: ScanSettings,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    pub skin_type: Option<String>,
    pub pregnant: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Also match detected names against common names.
    pub match_aliases: bool,
    pub history_limit: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            match_aliases: false,
            history_limit: 10,
        }
    }
}

impl Settings {
    /// Missing file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Profile from the `[profile]` section; overrides are applied by the caller.
    pub fn profile(&self) -> Result<UserProfile> {
        let skin_type = match &self.profile.skin_type {
            Some(code) => code
                .parse::<SkinType>()
                .map_err(|e| StoreError::InvalidData(format!("[profile] skin_type: {e}")))?,
            None => SkinType::default(),
        };
        Ok(UserProfile::new(skin_type, self.profile.pregnant))
    }
}

/// A resolved data directory holding the database and config file.
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Resolve and create the directory.
    pub fn open(explicit: Option<&Path>) -> Result<Self> {
        let root = resolve_data_dir(explicit);
        fs::create_dir_all(&root).map_err(|e| {
            StoreError::InvalidData(format!("failed to create {}: {e}", root.display()))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(DB_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn open_store(&self) -> Result<Store> {
        Store::open(&self.db_path())
    }

    pub fn settings(&self) -> Result<Settings> {
        Settings::load(&self.config_path())
    }
}
