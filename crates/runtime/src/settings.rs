//! Persisted client preferences.
//!
//! Only the battleground choice survives restarts. It lives in a small JSON
//! file under the platform data directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Selectable battle backdrop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Battleground {
    pub id: &'static str,
    pub name: &'static str,
}

pub const BATTLEGROUNDS: [Battleground; 4] = [
    Battleground {
        id: "bg-saiman",
        name: "Saiman",
    },
    Battleground {
        id: "bg-astral",
        name: "Astral",
    },
    Battleground {
        id: "bg-eoaalien",
        name: "Eoaalien",
    },
    Battleground {
        id: "bg-panight",
        name: "Panight",
    },
];

pub const DEFAULT_BATTLEGROUND: &str = "bg-astral";

const SETTINGS_FILE: &str = "settings.json";

pub fn find_battleground(id: &str) -> Option<&'static Battleground> {
    BATTLEGROUNDS.iter().find(|ground| ground.id == id)
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("no platform data directory available")]
    NoDataDir,

    #[error("unknown battleground: {0}")]
    UnknownBattleground(String),

    #[error("settings I/O failed at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings file")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct SettingsFile {
    battleground: String,
}

/// File-backed battleground preference.
#[derive(Debug, Clone)]
pub struct BattlegroundStore {
    path: PathBuf,
}

impl BattlegroundStore {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SETTINGS_FILE),
        }
    }

    /// Store under the platform data directory.
    pub fn default_location() -> Result<Self, SettingsError> {
        let dirs = directories::ProjectDirs::from("io", "avaxgods", "card-battle")
            .ok_or(SettingsError::NoDataDir)?;
        Ok(Self::in_dir(dirs.data_dir()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored choice, writing the default when none exists yet.
    ///
    /// A stored id that no longer names a battleground falls back to the
    /// default.
    pub fn load_or_init(&self) -> Result<String, SettingsError> {
        if !self.path.exists() {
            self.save(DEFAULT_BATTLEGROUND)?;
            return Ok(DEFAULT_BATTLEGROUND.to_string());
        }

        let contents = fs::read_to_string(&self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        let file: SettingsFile = serde_json::from_str(&contents)?;

        if find_battleground(&file.battleground).is_none() {
            tracing::warn!(stored = %file.battleground, "unknown battleground, using default");
            return Ok(DEFAULT_BATTLEGROUND.to_string());
        }
        Ok(file.battleground)
    }

    pub fn save(&self, id: &str) -> Result<(), SettingsError> {
        if find_battleground(id).is_none() {
            return Err(SettingsError::UnknownBattleground(id.to_string()));
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(&SettingsFile {
            battleground: id.to_string(),
        })?;
        fs::write(&self.path, contents).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
