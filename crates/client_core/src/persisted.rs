//! Typed access to the namespaced keys the options page persists.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::domain::{LocaleId, Project, SelectedProject};
use storage::{SettingsStore, StorageError};

pub mod keys {
    pub const TOKEN: &str = "phraseapp.token";
    pub const DOMAIN: &str = "phraseapp.domain";
    pub const CLIPBOARD: &str = "phraseapp.clipboard";
    pub const PROJECTS: &str = "phraseapp.projects";
    pub const SELECTED_PROJECT: &str = "phraseapp.project";
    pub const DEFAULT_LOCALE: &str = "phraseapp.default.locale";
}

#[derive(Clone)]
pub struct PersistedOptions {
    store: Arc<dyn SettingsStore>,
}

impl PersistedOptions {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key).await? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StorageError::serialization(key, source)),
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let value =
            serde_json::to_value(value).map_err(|source| StorageError::serialization(key, source))?;
        self.store.set(key, value).await
    }

    pub async fn token(&self) -> Result<Option<String>, StorageError> {
        self.read(keys::TOKEN).await
    }

    pub async fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.write(keys::TOKEN, token).await
    }

    pub async fn domain(&self) -> Result<Option<String>, StorageError> {
        self.read(keys::DOMAIN).await
    }

    pub async fn set_domain(&self, domain: &str) -> Result<(), StorageError> {
        self.write(keys::DOMAIN, domain).await
    }

    pub async fn clipboard(&self) -> Result<Option<bool>, StorageError> {
        self.read(keys::CLIPBOARD).await
    }

    pub async fn set_clipboard(&self, enabled: bool) -> Result<(), StorageError> {
        self.write(keys::CLIPBOARD, &enabled).await
    }

    pub async fn projects(&self) -> Result<Option<Vec<Project>>, StorageError> {
        self.read(keys::PROJECTS).await
    }

    pub async fn set_projects(&self, projects: &[Project]) -> Result<(), StorageError> {
        self.write(keys::PROJECTS, projects).await
    }

    pub async fn selected_project(&self) -> Result<Option<SelectedProject>, StorageError> {
        self.read(keys::SELECTED_PROJECT).await
    }

    pub async fn set_selected_project(&self, project: &SelectedProject) -> Result<(), StorageError> {
        self.write(keys::SELECTED_PROJECT, project).await
    }

    pub async fn default_locale(&self) -> Result<Option<LocaleId>, StorageError> {
        self.read(keys::DEFAULT_LOCALE).await
    }

    pub async fn set_default_locale(&self, locale_id: &LocaleId) -> Result<(), StorageError> {
        self.write(keys::DEFAULT_LOCALE, locale_id).await
    }

    pub async fn remove_default_locale(&self) -> Result<(), StorageError> {
        self.store.remove(keys::DEFAULT_LOCALE).await
    }

    /// Drops the selected project and the locale resolved for it.
    pub async fn clear_selection(&self) -> Result<(), StorageError> {
        self.store.remove(keys::SELECTED_PROJECT).await?;
        self.store.remove(keys::DEFAULT_LOCALE).await
    }

    /// Drops the project cache together with everything derived from it.
    pub async fn invalidate_project_cache(&self) -> Result<(), StorageError> {
        self.store.remove(keys::PROJECTS).await?;
        self.clear_selection().await
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.clear().await
    }
}
