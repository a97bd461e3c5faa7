//! Settings synchronization for the translation-tool options page.
//!
//! [`options::OptionsController`] reconciles three sources of truth: the
//! persisted settings store, the remote project/locale API and the form the
//! user edits. [`runtime::OptionsRuntime`] drives it from a single event queue.

pub mod notification;
pub mod options;
pub mod persisted;
pub mod remote;
pub mod runtime;
pub mod validator;

#[cfg(test)]
mod test_support;

pub use notification::{ChannelNotifier, LogNotifier, Notification, NotificationSink};
pub use options::{
    FieldStatus, LocaleResolution, OptionsController, OptionsDefaults, OptionsDependencies,
    OptionsError, OptionsState, ProjectsRefresh, SaveOutcome,
};
pub use persisted::PersistedOptions;
pub use remote::{PhraseClient, RemoteClient, RemoteError};
pub use runtime::{DispatchError, OptionsEvent, OptionsHandle, OptionsRuntime};
pub use validator::{normalize_domain, FormatValidator, Validator};
