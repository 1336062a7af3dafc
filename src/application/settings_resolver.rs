//! Resolves and saves the builder settings documents.
//!
//! Missing documents resolve to the structural defaults silently. A document
//! that exists but cannot be decoded also falls back to the defaults, with a
//! warning, so a broken builder edit never blocks participants.
//!
//! Offline runs read the same documents from a local YAML or JSON file with
//! [`read_settings_file`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::settings::{AllSettings, SettingName};
use crate::ports::{AppSettingRecord, AppSettingsStore, StoreError};

pub struct SettingsResolver {
    store: Arc<dyn AppSettingsStore>,
}

impl SettingsResolver {
    pub fn new(store: Arc<dyn AppSettingsStore>) -> Self {
        Self { store }
    }

    /// Reads all three documents, substituting defaults where needed.
    pub async fn resolve(&self) -> Result<AllSettings, StoreError> {
        let documents = self.store.list().await?;
        Ok(AllSettings {
            assistants: pick(&documents, SettingName::Assistants),
            chat: pick(&documents, SettingName::Chat),
            exchanges: pick(&documents, SettingName::Exchanges),
        })
    }

    /// Creates the named document, or patches it when it already exists.
    pub async fn save<T: Serialize>(&self, name: SettingName, value: &T) -> Result<AppSettingRecord, StoreError> {
        let data = serde_json::to_value(value)?;
        let existing = self
            .store
            .list()
            .await?
            .into_iter()
            .find(|d| d.name == name.as_str());

        match existing {
            Some(doc) => {
                debug!(setting = %name, record_id = %doc.id, "Patching settings document");
                self.store.patch(&doc.id, data).await
            }
            None => {
                debug!(setting = %name, "Creating settings document");
                self.store.create(name.as_str(), data).await
            }
        }
    }

    /// Saves all three documents.
    pub async fn save_all(&self, settings: &AllSettings) -> Result<(), StoreError> {
        self.save(SettingName::Assistants, &settings.assistants).await?;
        self.save(SettingName::Chat, &settings.chat).await?;
        self.save(SettingName::Exchanges, &settings.exchanges).await?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SettingsFileError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

/// Reads all settings from one file holding `assistants`, `chat` and
/// `exchanges` keys. JSON files parse as YAML. Missing keys take defaults.
pub fn read_settings_file(path: &Path) -> Result<AllSettings, SettingsFileError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| SettingsFileError::Io {
        path: display.clone(),
        source,
    })?;
    let settings = serde_yaml::from_str(&raw).map_err(|source| SettingsFileError::Parse { path: display, source })?;
    debug!(path = %path.display(), "Loaded settings file");
    Ok(settings)
}

fn pick<T: DeserializeOwned + Default>(documents: &[AppSettingRecord], name: SettingName) -> T {
    let Some(doc) = documents.iter().find(|d| d.name == name.as_str()) else {
        debug!(setting = %name, "Settings document absent, using defaults");
        return T::default();
    };
    match serde_json::from_value(doc.data.clone()) {
        Ok(value) => value,
        Err(err) => {
            warn!(setting = %name, record_id = %doc.id, error = %err, "Undecodable settings document, using defaults");
            T::default()
        }
    }
}
