//! Event loop driving an [`OptionsController`].
//!
//! View events and tagged remote completions share one queue and are applied
//! strictly in arrival order. Remote calls run as spawned tasks, so they are
//! the only points where user actions can interleave with a lookup.

use shared::domain::{Locale, Project, ProjectId};
use thiserror::Error;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    watch,
};
use tracing::{debug, error};

use crate::{
    options::{LocalesRequest, OptionsController, OptionsError, OptionsState, ProjectsRequest},
    remote::RemoteError,
};

const EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug)]
pub enum OptionsEvent {
    TokenEdited(String),
    DomainEdited(String),
    ProjectHighlighted(ProjectId),
    SaveRequested,
    RefreshRequested,
    ProjectSelected(ProjectId),
    ClipboardToggled(bool),
    AdvancedToggled,
    ResetRequested,
    ProjectsFetched {
        request: ProjectsRequest,
        result: Result<Vec<Project>, RemoteError>,
    },
    LocalesFetched {
        request: LocalesRequest,
        result: Result<Vec<Locale>, RemoteError>,
    },
    /// Stops accepting view events and exits once in-flight lookups land.
    Shutdown,
}

impl OptionsEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::TokenEdited(_) => "token_edited",
            Self::DomainEdited(_) => "domain_edited",
            Self::ProjectHighlighted(_) => "project_highlighted",
            Self::SaveRequested => "save_requested",
            Self::RefreshRequested => "refresh_requested",
            Self::ProjectSelected(_) => "project_selected",
            Self::ClipboardToggled(_) => "clipboard_toggled",
            Self::AdvancedToggled => "advanced_toggled",
            Self::ResetRequested => "reset_requested",
            Self::ProjectsFetched { .. } => "projects_fetched",
            Self::LocalesFetched { .. } => "locales_fetched",
            Self::Shutdown => "shutdown",
        }
    }

    fn is_completion(&self) -> bool {
        matches!(
            self,
            Self::ProjectsFetched { .. } | Self::LocalesFetched { .. }
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("options event queue is full; please retry")]
    QueueFull,
    #[error("options runtime has stopped")]
    Disconnected,
}

/// Cloneable sender side handed to views.
#[derive(Clone)]
pub struct OptionsHandle {
    tx: mpsc::Sender<OptionsEvent>,
}

impl OptionsHandle {
    pub fn dispatch(&self, event: OptionsEvent) -> Result<(), DispatchError> {
        let name = event.name();
        match self.tx.try_send(event) {
            Ok(()) => {
                debug!(event = name, "queued options event");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(DispatchError::QueueFull),
            Err(TrySendError::Closed(_)) => Err(DispatchError::Disconnected),
        }
    }

    pub async fn send(&self, event: OptionsEvent) -> Result<(), DispatchError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| DispatchError::Disconnected)
    }
}

pub struct OptionsRuntime {
    controller: OptionsController,
    tx: mpsc::Sender<OptionsEvent>,
    rx: mpsc::Receiver<OptionsEvent>,
    state_tx: watch::Sender<OptionsState>,
    in_flight: usize,
    draining: bool,
}

impl OptionsRuntime {
    pub fn new(controller: OptionsController) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (state_tx, _) = watch::channel(controller.state().clone());
        Self {
            controller,
            tx,
            rx,
            state_tx,
            in_flight: 0,
            draining: false,
        }
    }

    pub fn handle(&self) -> OptionsHandle {
        OptionsHandle {
            tx: self.tx.clone(),
        }
    }

    /// Receives a snapshot after every processed event.
    pub fn subscribe(&self) -> watch::Receiver<OptionsState> {
        self.state_tx.subscribe()
    }

    /// Runs until [`OptionsEvent::Shutdown`] has been received and every
    /// spawned lookup has reported back, then hands the controller back.
    /// Dropping every handle does not stop it; the runtime keeps a sender for
    /// its own lookups.
    pub async fn run(mut self) -> OptionsController {
        while let Some(event) = self.rx.recv().await {
            let name = event.name();
            if let Err(err) = self.handle_event(event).await {
                error!(event = name, error = %err, "options event failed");
                self.controller.notifier().error(&err.to_string());
            }
            self.state_tx.send_replace(self.controller.state().clone());

            if self.draining && self.in_flight == 0 {
                break;
            }
        }
        debug!("options runtime stopped");
        self.controller
    }

    async fn handle_event(&mut self, event: OptionsEvent) -> Result<(), OptionsError> {
        if event.is_completion() {
            self.in_flight = self.in_flight.saturating_sub(1);
        } else if self.draining {
            debug!(event = event.name(), "ignoring view event while shutting down");
            return Ok(());
        }

        match event {
            OptionsEvent::TokenEdited(token) => {
                self.controller.edit_token(token);
            }
            OptionsEvent::DomainEdited(domain) => self.controller.edit_domain(domain),
            OptionsEvent::ProjectHighlighted(project_id) => {
                self.controller.highlight_project(&project_id);
            }
            OptionsEvent::SaveRequested => {
                let outcome = self.controller.save().await?;
                debug!(?outcome, "save handled");
            }
            OptionsEvent::RefreshRequested => {
                let request = self.controller.begin_refresh_projects();
                self.spawn_projects_fetch(request);
            }
            OptionsEvent::ProjectSelected(project_id) => {
                if let Some(request) = self.controller.select_project(&project_id).await? {
                    self.spawn_locales_fetch(request);
                }
            }
            OptionsEvent::ClipboardToggled(enabled) => self.controller.set_clipboard(enabled).await?,
            OptionsEvent::AdvancedToggled => {
                self.controller.toggle_advanced_options();
            }
            OptionsEvent::ResetRequested => self.controller.reset().await?,
            OptionsEvent::ProjectsFetched { request, result } => {
                let outcome = self
                    .controller
                    .complete_refresh_projects(request, result)
                    .await?;
                debug!(?outcome, "project fetch handled");
            }
            OptionsEvent::LocalesFetched { request, result } => {
                let outcome = self
                    .controller
                    .complete_resolve_default_locale(request, result)
                    .await?;
                debug!(?outcome, "locale fetch handled");
            }
            OptionsEvent::Shutdown => self.draining = true,
        }
        Ok(())
    }

    fn spawn_projects_fetch(&mut self, request: ProjectsRequest) {
        let remote = self.controller.remote();
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = remote.list_projects().await;
            if tx
                .send(OptionsEvent::ProjectsFetched { request, result })
                .await
                .is_err()
            {
                debug!("runtime gone before project list arrived");
            }
        });
    }

    fn spawn_locales_fetch(&mut self, request: LocalesRequest) {
        let remote = self.controller.remote();
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = remote.list_locales(request.project_id()).await;
            if tx
                .send(OptionsEvent::LocalesFetched { request, result })
                .await
                .is_err()
            {
                debug!("runtime gone before locales arrived");
            }
        });
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
