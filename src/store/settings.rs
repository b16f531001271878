//! Persistent settings store.
//!
//! Settings ride the same envelope mechanism as snapshots, under the fixed
//! key `app-settings`, but never expire. A missing, unreadable, or
//! version-mismatched record is replaced wholesale by defaults; callers
//! always get a usable `Settings`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AppError, Result};
use crate::models::Settings;
use crate::store::cache_key;

pub const SETTINGS_VERSION: u32 = 1;

const SETTINGS_KEY: &str = "app-settings";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SettingsRecord {
    key: String,
    timestamp: i64,
    version: u32,
    data: Settings,
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    file: PathBuf,
}

impl SettingsStore {
    pub fn new(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir).map_err(|e| {
            AppError::Config(format!("cannot create data directory {}: {}", data_dir.display(), e))
        })?;
        Ok(Self {
            file: data_dir.join(format!("{}.json", cache_key(SETTINGS_KEY))),
        })
    }

    /// Reads settings, falling back to defaults on any validation failure.
    pub fn load(&self) -> Settings {
        let raw = match fs::read_to_string(&self.file) {
            Ok(raw) => raw,
            Err(_) => return Settings::default(),
        };
        let record: SettingsRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("settings record {} failed validation, using defaults: {}", self.file.display(), e);
                return Settings::default();
            }
        };
        if record.version != SETTINGS_VERSION || record.key != SETTINGS_KEY {
            warn!("settings record {} has wrong version or key, using defaults", self.file.display());
            return Settings::default();
        }
        record.data
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        let record = SettingsRecord {
            key: SETTINGS_KEY.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            version: SETTINGS_VERSION,
            data: settings.clone(),
        };
        let body = serde_json::to_string(&record).map_err(|e| AppError::Internal(e.to_string()))?;
        let tmp = self.file.with_extension("json.tmp");
        fs::write(&tmp, body)
            .map_err(|e| AppError::Internal(format!("settings write failed: {}", e)))?;
        fs::rename(&tmp, &self.file)
            .map_err(|e| AppError::Internal(format!("settings rename failed: {}", e)))?;
        Ok(())
    }

    /// Writes defaults back to disk and returns them.
    pub fn reset(&self) -> Result<Settings> {
        let defaults = Settings::default();
        self.save(&defaults)?;
        Ok(defaults)
    }
}
