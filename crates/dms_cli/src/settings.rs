//! Settings management
//!
//! Settings persist as `settings.json` in the data directory. A missing
//! file means defaults; a file that fails to parse also falls back to
//! defaults and the parse error is kept for the caller to report.

use dms_model::{Role, RoleRegistry, DEFAULT_PRIVILEGED_ROLE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Main settings container
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DmsSettings {
    pub storage: StorageSettings,
    pub auth: AuthSettings,
    pub logging: LoggingSettings,
}

impl Default for DmsSettings {
    fn default() -> Self {
        Self {
            storage: StorageSettings::default(),
            auth: AuthSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl DmsSettings {
    /// Registry of the configured roles
    pub fn role_registry(&self) -> RoleRegistry {
        RoleRegistry::new(self.auth.roles.clone(), self.auth.privileged_role.clone())
    }

    /// Directory holding the document store. Relative paths resolve against
    /// the data directory.
    pub fn storage_path(&self, data_dir: &Path) -> PathBuf {
        let dir = Path::new(&self.storage.documents_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            data_dir.join(dir)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    /// Document store directory
    pub documents_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            documents_dir: "documents".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthSettings {
    /// Lifetime of issued tokens in days
    pub token_ttl_days: i64,
    /// Title of the role that reads every non-private document
    pub privileged_role: String,
    /// Known roles
    pub roles: Vec<Role>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        let registry = RoleRegistry::default();
        Self {
            token_ttl_days: auth::DEFAULT_TOKEN_TTL_DAYS,
            privileged_role: DEFAULT_PRIVILEGED_ROLE.to_string(),
            roles: registry.roles().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Settings manager for loading, saving, and updating settings
pub struct SettingsManager {
    data_dir: PathBuf,
    settings_path: PathBuf,
    current: DmsSettings,
    parse_error: Option<String>,
}

impl SettingsManager {
    /// Create a new settings manager for the given data directory
    pub fn new(data_dir: PathBuf) -> Self {
        let settings_path = data_dir.join("settings.json");
        Self {
            data_dir,
            settings_path,
            current: DmsSettings::default(),
            parse_error: None,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn exists(&self) -> bool {
        self.settings_path.exists()
    }

    /// Why the last load fell back to defaults, if it did
    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    /// Load settings synchronously (for use before logging is set up)
    pub fn load_sync(&mut self) -> Result<&DmsSettings> {
        if self.settings_path.exists() {
            let content = std::fs::read_to_string(&self.settings_path)?;
            self.apply_loaded(&content);
        } else {
            self.current = DmsSettings::default();
            self.parse_error = None;
        }
        Ok(&self.current)
    }

    fn apply_loaded(&mut self, content: &str) {
        match serde_json::from_str::<DmsSettings>(content) {
            Ok(settings) => {
                self.current = settings;
                self.parse_error = None;
            }
            Err(e) => {
                self.current = DmsSettings::default();
                self.parse_error = Some(e.to_string());
            }
        }
    }

    /// Save current settings to disk
    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(&self.current)?;
        tokio::fs::write(&self.settings_path, content).await?;
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &DmsSettings {
        &self.current
    }

    /// Reset settings to defaults and save
    pub async fn reset(&mut self) -> Result<&DmsSettings> {
        self.current = DmsSettings::default();
        self.save().await?;
        Ok(&self.current)
    }
}
