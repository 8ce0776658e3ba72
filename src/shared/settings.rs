use serde::{Deserialize, Serialize};
use ts_rs::TS;
use tokio::fs;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use log::{debug, info};
use crate::shared::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(default)]
#[ts(export)]
pub struct AppSettings {
    pub storage: StorageSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum StorageBackend {
    Memory,
    #[default]
    JsonFile,
    Redb,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Default)]
#[serde(default)]
#[ts(export)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Overrides the platform data directory
    #[ts(type = "string | null")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct DisplaySettings {
    pub decimal_places: usize,
    pub locale: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            decimal_places: 6,
            locale: "en".to_string(),
        }
    }
}

impl AppSettings {
    pub fn get_settings_path() -> AppResult<PathBuf> {
        ProjectDirs::from("com", "calculator-hub", "calculator-hub")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or_else(|| AppError::Config("Failed to determine config directory".to_string()))
    }

    pub async fn load() -> AppResult<Self> {
        let path = Self::get_settings_path()?;
        Self::load_from(&path).await
    }

    /// Read settings from `path`; a missing file is created with defaults
    pub async fn load_from(path: &Path) -> AppResult<Self> {
        if !fs::try_exists(path).await? {
            info!("[Settings] No settings at {}, writing defaults", path.display());
            let settings = Self::default();
            settings.save_to(path).await?;
            return Ok(settings);
        }

        let content = fs::read_to_string(path).await
            .map_err(|e| AppError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse settings: {}", e)))
    }

    pub async fn save(&self) -> AppResult<()> {
        let path = Self::get_settings_path()?;
        self.save_to(&path).await
    }

    pub async fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await
                .map_err(|e| AppError::Io(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)?;

        fs::write(path, content).await
            .map_err(|e| AppError::Io(format!("Failed to write settings file: {}", e)))?;
        debug!("[Settings] Saved {}", path.display());
        Ok(())
    }
}
