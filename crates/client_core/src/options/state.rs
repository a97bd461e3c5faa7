use serde::{Deserialize, Serialize};
use shared::domain::{LocaleId, Project, ProjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    #[default]
    Ok,
    Error,
}

impl FieldStatus {
    pub fn from_valid(valid: bool) -> Self {
        if valid {
            Self::Ok
        } else {
            Self::Error
        }
    }

    pub fn is_error(self) -> bool {
        self == Self::Error
    }
}

/// Everything the view needs to render the options page. The view never
/// mutates this directly; it sends events to the controller instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsState {
    pub token_input: String,
    pub domain_input: String,
    pub clipboard: bool,
    /// Options currently rendered in the project selector.
    pub projects: Vec<Project>,
    /// Highlighted option in the project selector.
    pub selected_project_id: Option<ProjectId>,
    pub default_locale: Option<LocaleId>,
    pub token_status: FieldStatus,
    pub domain_status: FieldStatus,
    pub projects_status: FieldStatus,
    pub save_enabled: bool,
    pub update_enabled: bool,
    pub advanced_open: bool,
}

impl OptionsState {
    /// The option a native single-select would report as chosen: the
    /// highlighted one, or the first rendered option when none is.
    pub fn highlighted_project(&self) -> Option<&Project> {
        self.selected_project_id
            .as_ref()
            .and_then(|id| self.find_project(id))
            .or_else(|| self.projects.first())
    }

    pub fn find_project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| &project.id == id)
    }

    pub(crate) fn set_credential_actions(&mut self, enabled: bool) {
        self.save_enabled = enabled;
        self.update_enabled = enabled;
    }

    pub(crate) fn clear_project_selector(&mut self) {
        self.projects.clear();
        self.selected_project_id = None;
        self.default_locale = None;
    }
}
