use std::sync::Arc;

use shared::domain::{Locale, LocaleId, Project, ProjectId, SelectedProject};
use storage::{SettingsStore, StorageError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    notification::NotificationSink,
    options::state::{FieldStatus, OptionsState},
    persisted::PersistedOptions,
    remote::{RemoteClient, RemoteError},
    validator::{normalize_domain, FormatValidator, Validator},
};

const SAVED_MESSAGE: &str = "Successfully saved options";
const NO_LOCALES_MESSAGE: &str = "The selected project has no locales.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsDefaults {
    pub default_domain: String,
    pub default_clipboard: bool,
    /// Locale code whose id becomes the default locale of a selected project.
    pub locale_code: String,
}

impl Default for OptionsDefaults {
    fn default() -> Self {
        Self {
            default_domain: "phraseapp.com".to_string(),
            default_clipboard: false,
            locale_code: "en".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("settings storage failed: {0}")]
    Storage(#[from] StorageError),
}

pub struct OptionsDependencies {
    pub store: Arc<dyn SettingsStore>,
    pub remote: Arc<dyn RemoteClient>,
    pub notifier: Arc<dyn NotificationSink>,
    pub validator: Arc<dyn Validator>,
}

impl OptionsDependencies {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        remote: Arc<dyn RemoteClient>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            remote,
            notifier,
            validator: Arc::new(FormatValidator),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved {
        /// A different credential replaced a previously saved one.
        rotated: bool,
    },
    /// Nothing was written.
    Rejected { domain_valid: bool, token_valid: bool },
}

/// Correlation tag for an in-flight project list fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectsRequest {
    sequence: u64,
    credential_epoch: u64,
}

/// Correlation tag for an in-flight locale lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalesRequest {
    sequence: u64,
    credential_epoch: u64,
    project_id: ProjectId,
    /// Persisted selection when the lookup started.
    selection: Option<ProjectId>,
}

impl LocalesRequest {
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectsRefresh {
    Applied { count: usize },
    Failed,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleResolution {
    Applied(LocaleId),
    /// Locales exist but none carries the target code. Not an error.
    NoMatch,
    NoLocales,
    Failed,
    Stale,
}

pub struct OptionsController {
    settings: PersistedOptions,
    remote: Arc<dyn RemoteClient>,
    notifier: Arc<dyn NotificationSink>,
    validator: Arc<dyn Validator>,
    defaults: OptionsDefaults,
    state: OptionsState,
    credential_epoch: u64,
    next_sequence: u64,
    latest_projects: Option<u64>,
    latest_locales: Option<u64>,
}

impl std::fmt::Debug for OptionsController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsController")
            .field("defaults", &self.defaults)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl OptionsController {
    /// Builds the controller and rehydrates the form from the store. Makes no
    /// remote calls; a cached project list is rendered as is.
    pub async fn initialize(
        deps: OptionsDependencies,
        defaults: OptionsDefaults,
    ) -> Result<Self, OptionsError> {
        let mut controller = Self {
            settings: PersistedOptions::new(deps.store),
            remote: deps.remote,
            notifier: deps.notifier,
            validator: deps.validator,
            defaults,
            state: OptionsState::default(),
            credential_epoch: 0,
            next_sequence: 0,
            latest_projects: None,
            latest_locales: None,
        };
        controller.rehydrate().await?;
        Ok(controller)
    }

    async fn rehydrate(&mut self) -> Result<(), OptionsError> {
        match self.settings.clipboard().await? {
            Some(enabled) => self.state.clipboard = enabled,
            None => {
                self.state.clipboard = self.defaults.default_clipboard;
                self.settings
                    .set_clipboard(self.defaults.default_clipboard)
                    .await?;
            }
        }

        if let Some(token) = self.settings.token().await? {
            self.state.token_input = token;
            self.state.set_credential_actions(true);
        }

        match self.settings.domain().await? {
            Some(domain) => self.state.domain_input = domain,
            None => {
                self.state.domain_input = self.defaults.default_domain.clone();
                self.settings.set_domain(&self.defaults.default_domain).await?;
            }
        }

        if let Some(projects) = self.settings.projects().await? {
            let selected = self.settings.selected_project().await?;
            self.render_projects(projects, selected.as_ref());
        }
        self.state.default_locale = self.settings.default_locale().await?;

        info!(
            has_token = !self.state.token_input.is_empty(),
            cached_projects = self.state.projects.len(),
            "rehydrated options"
        );
        Ok(())
    }

    pub fn state(&self) -> &OptionsState {
        &self.state
    }

    pub fn defaults(&self) -> &OptionsDefaults {
        &self.defaults
    }

    pub fn remote(&self) -> Arc<dyn RemoteClient> {
        Arc::clone(&self.remote)
    }

    pub fn notifier(&self) -> Arc<dyn NotificationSink> {
        Arc::clone(&self.notifier)
    }

    pub fn credential_epoch(&self) -> u64 {
        self.credential_epoch
    }

    /// Gates the save/update actions on the token format. Persists nothing.
    pub fn check_credential_field(&mut self, token: &str) -> bool {
        let valid = self.validator.is_token_valid(token);
        self.apply_credential_check(valid);
        valid
    }

    fn apply_credential_check(&mut self, valid: bool) {
        self.state.token_status = FieldStatus::from_valid(valid);
        self.state.set_credential_actions(valid);
    }

    pub fn edit_token(&mut self, token: impl Into<String>) -> bool {
        self.state.token_input = token.into();
        let valid = self.validator.is_token_valid(&self.state.token_input);
        self.apply_credential_check(valid);
        valid
    }

    pub fn edit_domain(&mut self, domain: impl Into<String>) {
        self.state.domain_input = domain.into();
    }

    /// Moves the selector highlight without persisting anything. Returns
    /// false when `project_id` is not a rendered option.
    pub fn highlight_project(&mut self, project_id: &ProjectId) -> bool {
        if self.state.find_project(project_id).is_none() {
            return false;
        }
        self.state.selected_project_id = Some(project_id.clone());
        true
    }

    pub fn toggle_advanced_options(&mut self) -> bool {
        self.state.advanced_open = !self.state.advanced_open;
        self.state.advanced_open
    }

    pub async fn save(&mut self) -> Result<SaveOutcome, OptionsError> {
        let domain = normalize_domain(&self.state.domain_input);
        let domain_valid = domain.is_empty() || self.validator.is_domain_valid(&domain);
        let token = self.state.token_input.clone();
        let token_valid = self.validator.is_token_valid(&token);

        self.state.domain_status = FieldStatus::from_valid(domain_valid);
        if !token_valid {
            self.apply_credential_check(false);
        }
        if !domain_valid || !token_valid {
            debug!(domain_valid, token_valid, "save rejected");
            return Ok(SaveOutcome::Rejected {
                domain_valid,
                token_valid,
            });
        }

        let previous = self.settings.token().await?;
        let rotated = previous.as_deref().is_some_and(|previous| previous != token);
        if previous.as_deref() != Some(token.as_str()) {
            self.advance_credential_epoch();
        }

        // The cache must be gone before the new credential is visible.
        if rotated {
            self.state.clear_project_selector();
            self.settings.invalidate_project_cache().await?;
            info!("credential rotated; project cache invalidated");
        }

        self.settings.set_domain(&domain).await?;
        self.state.domain_input = domain;
        self.settings.set_token(&token).await?;
        self.apply_credential_check(true);

        if let Some(project) = self.state.highlighted_project().map(SelectedProject::from) {
            self.settings.set_selected_project(&project).await?;
            self.state.selected_project_id = Some(project.id);
        }

        info!(rotated, token_len = token.len(), "options saved");
        self.notifier.success(SAVED_MESSAGE);
        Ok(SaveOutcome::Saved { rotated })
    }

    pub fn begin_refresh_projects(&mut self) -> ProjectsRequest {
        let request = ProjectsRequest {
            sequence: self.take_sequence(),
            credential_epoch: self.credential_epoch,
        };
        self.latest_projects = Some(request.sequence);
        request
    }

    pub async fn complete_refresh_projects(
        &mut self,
        request: ProjectsRequest,
        result: Result<Vec<Project>, RemoteError>,
    ) -> Result<ProjectsRefresh, OptionsError> {
        if request.credential_epoch != self.credential_epoch
            || self.latest_projects != Some(request.sequence)
        {
            debug!(sequence = request.sequence, "discarding stale project list");
            return Ok(ProjectsRefresh::Stale);
        }
        self.latest_projects = None;

        let projects = match result {
            Ok(projects) => projects,
            Err(err) => {
                warn!(error = %err, "project list fetch failed");
                self.notifier.error(&remote_failure_message(&err));
                return Ok(ProjectsRefresh::Failed);
            }
        };

        let mut selected = self.settings.selected_project().await?;
        if selected
            .as_ref()
            .is_some_and(|selected| !projects.iter().any(|project| project.id == selected.id))
        {
            self.settings.clear_selection().await?;
            self.state.default_locale = None;
            selected = None;
            info!("selected project no longer listed; selection cleared");
        }
        self.settings.set_projects(&projects).await?;
        let count = projects.len();
        self.render_projects(projects, selected.as_ref());
        info!(count, "project list refreshed");
        Ok(ProjectsRefresh::Applied { count })
    }

    pub async fn refresh_projects(&mut self) -> Result<ProjectsRefresh, OptionsError> {
        let request = self.begin_refresh_projects();
        let result = self.remote.list_projects().await;
        self.complete_refresh_projects(request, result).await
    }

    /// Persists the chosen option and starts locale resolution for it.
    /// Returns `None` when `project_id` is not a rendered option.
    pub async fn select_project(
        &mut self,
        project_id: &ProjectId,
    ) -> Result<Option<LocalesRequest>, OptionsError> {
        let Some(project) = self.state.find_project(project_id).map(SelectedProject::from) else {
            debug!(%project_id, "ignoring selection of unknown project");
            return Ok(None);
        };

        self.settings.set_selected_project(&project).await?;
        self.state.selected_project_id = Some(project.id.clone());
        Ok(Some(self.begin_resolve_default_locale(project.id).await?))
    }

    /// Tags a locale lookup for `project_id`. The result is applied only if
    /// the credential and the persisted selection are unchanged by then and
    /// no newer lookup has started.
    pub async fn begin_resolve_default_locale(
        &mut self,
        project_id: ProjectId,
    ) -> Result<LocalesRequest, OptionsError> {
        let selection = self
            .settings
            .selected_project()
            .await?
            .map(|selected| selected.id);
        let request = LocalesRequest {
            sequence: self.take_sequence(),
            credential_epoch: self.credential_epoch,
            project_id,
            selection,
        };
        self.latest_locales = Some(request.sequence);
        Ok(request)
    }

    pub async fn complete_resolve_default_locale(
        &mut self,
        request: LocalesRequest,
        result: Result<Vec<Locale>, RemoteError>,
    ) -> Result<LocaleResolution, OptionsError> {
        if !self.is_current_locales_request(&request).await? {
            debug!(
                project_id = %request.project_id,
                sequence = request.sequence,
                "discarding stale locale resolution"
            );
            return Ok(LocaleResolution::Stale);
        }
        self.latest_locales = None;

        let locales = match result {
            Ok(locales) => locales,
            Err(err) => {
                warn!(project_id = %request.project_id, error = %err, "locale fetch failed");
                self.state.projects_status = FieldStatus::Error;
                self.notifier.error(&remote_failure_message(&err));
                return Ok(LocaleResolution::Failed);
            }
        };

        if locales.is_empty() {
            self.forget_default_locale().await?;
            self.state.projects_status = FieldStatus::Error;
            self.notifier.error(NO_LOCALES_MESSAGE);
            return Ok(LocaleResolution::NoLocales);
        }

        let Some(locale) = locales
            .iter()
            .find(|locale| locale.code == self.defaults.locale_code)
        else {
            debug!(
                project_id = %request.project_id,
                locale_code = %self.defaults.locale_code,
                "no locale matches the target code"
            );
            self.forget_default_locale().await?;
            self.state.projects_status = FieldStatus::Ok;
            return Ok(LocaleResolution::NoMatch);
        };

        self.state.projects_status = FieldStatus::Ok;
        self.settings.set_default_locale(&locale.id).await?;
        self.state.default_locale = Some(locale.id.clone());
        info!(project_id = %request.project_id, locale_id = %locale.id, "default locale resolved");
        Ok(LocaleResolution::Applied(locale.id.clone()))
    }

    pub async fn run_locale_request(
        &mut self,
        request: LocalesRequest,
    ) -> Result<LocaleResolution, OptionsError> {
        let result = self.remote.list_locales(request.project_id()).await;
        self.complete_resolve_default_locale(request, result).await
    }

    pub async fn resolve_default_locale(
        &mut self,
        project_id: ProjectId,
    ) -> Result<LocaleResolution, OptionsError> {
        let request = self.begin_resolve_default_locale(project_id).await?;
        self.run_locale_request(request).await
    }

    async fn is_current_locales_request(
        &self,
        request: &LocalesRequest,
    ) -> Result<bool, OptionsError> {
        if request.credential_epoch != self.credential_epoch
            || self.latest_locales != Some(request.sequence)
        {
            return Ok(false);
        }
        let selection = self
            .settings
            .selected_project()
            .await?
            .map(|selected| selected.id);
        Ok(selection == request.selection)
    }

    async fn forget_default_locale(&mut self) -> Result<(), OptionsError> {
        self.settings.remove_default_locale().await?;
        self.state.default_locale = None;
        Ok(())
    }

    pub async fn set_clipboard(&mut self, enabled: bool) -> Result<(), OptionsError> {
        self.state.clipboard = enabled;
        self.settings.set_clipboard(enabled).await?;
        Ok(())
    }

    /// Wipes every persisted key and re-seeds the default domain.
    pub async fn reset(&mut self) -> Result<(), OptionsError> {
        self.advance_credential_epoch();

        let advanced_open = self.state.advanced_open;
        self.state = OptionsState {
            domain_input: self.defaults.default_domain.clone(),
            clipboard: self.defaults.default_clipboard,
            advanced_open,
            ..OptionsState::default()
        };

        self.settings.clear().await?;
        self.settings.set_domain(&self.defaults.default_domain).await?;
        info!("options reset to defaults");
        Ok(())
    }

    fn render_projects(&mut self, projects: Vec<Project>, selected: Option<&SelectedProject>) {
        self.state.selected_project_id = selected
            .filter(|selected| projects.iter().any(|project| project.id == selected.id))
            .map(|selected| selected.id.clone());
        self.state.projects = projects;
    }

    fn advance_credential_epoch(&mut self) {
        self.credential_epoch += 1;
        self.latest_projects = None;
        self.latest_locales = None;
    }

    fn take_sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }
}

fn remote_failure_message(err: &RemoteError) -> String {
    match err {
        RemoteError::MissingToken => "Save a valid access token before loading projects.".to_string(),
        RemoteError::Unauthorized(_) => {
            "The access token was rejected; check it and save again.".to_string()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "../tests/controller_tests.rs"]
mod tests;
