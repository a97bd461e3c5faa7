//! Options page reconciliation: persisted settings, remote projects/locales
//! and form state merged into one [`OptionsState`].

mod controller;
mod state;

pub use controller::{
    LocaleResolution, LocalesRequest, OptionsController, OptionsDefaults, OptionsDependencies,
    OptionsError, ProjectsRefresh, ProjectsRequest, SaveOutcome,
};
pub use state::{FieldStatus, OptionsState};
