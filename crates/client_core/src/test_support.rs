//! Fakes shared by the unit tests of this crate.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use async_trait::async_trait;
use serde_json::Value;
use shared::{
    domain::{Locale, Project, ProjectId},
    error::ApiException,
};
use storage::{MemorySettingsStore, SettingsStore, StorageError};
use tokio::sync::{oneshot, Mutex};

use crate::{
    notification::{Notification, NotificationSink},
    options::{OptionsController, OptionsDefaults, OptionsDependencies},
    remote::{RemoteClient, RemoteError},
};

pub fn token(c: char) -> String {
    std::iter::repeat(c).take(64).collect()
}

#[derive(Debug, Clone)]
pub enum Scripted<T> {
    Ok(T),
    Fail(String),
}

impl<T: Clone> Scripted<T> {
    fn produce(&self) -> Result<T, RemoteError> {
        match self {
            Self::Ok(value) => Ok(value.clone()),
            Self::Fail(message) => Err(ApiException::new(503, message.clone()).into()),
        }
    }
}

#[derive(Default)]
pub struct ScriptedRemote {
    projects: Mutex<Option<Scripted<Vec<Project>>>>,
    locales: Mutex<HashMap<ProjectId, Scripted<Vec<Locale>>>>,
    project_gate: Mutex<Option<oneshot::Receiver<()>>>,
    locale_gates: Mutex<HashMap<ProjectId, oneshot::Receiver<()>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn script_projects(&self, projects: Scripted<Vec<Project>>) {
        *self.projects.lock().await = Some(projects);
    }

    pub async fn script_locales(&self, project_id: &str, locales: Scripted<Vec<Locale>>) {
        self.locales
            .lock()
            .await
            .insert(ProjectId::from(project_id), locales);
    }

    /// Holds the next `list_projects` call until the returned sender fires.
    pub async fn gate_projects(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.project_gate.lock().await = Some(rx);
        tx
    }

    /// Holds the next `list_locales` call for `project_id` until released.
    pub async fn gate_locales(&self, project_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.locale_gates
            .lock()
            .await
            .insert(ProjectId::from(project_id), rx);
        tx
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl RemoteClient for ScriptedRemote {
    async fn list_projects(&self) -> Result<Vec<Project>, RemoteError> {
        self.calls.lock().await.push("list_projects".to_string());
        let gate = self.project_gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match self.projects.lock().await.as_ref() {
            Some(scripted) => scripted.produce(),
            None => Ok(Vec::new()),
        }
    }

    async fn list_locales(&self, project_id: &ProjectId) -> Result<Vec<Locale>, RemoteError> {
        self.calls
            .lock()
            .await
            .push(format!("list_locales {project_id}"));
        let gate = self.locale_gates.lock().await.remove(project_id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match self.locales.lock().await.get(project_id) {
            Some(scripted) => scripted.produce(),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    seen: StdMutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seen(&self) -> Vec<Notification> {
        self.seen.lock().expect("notifier lock").clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.seen()
            .into_iter()
            .filter(Notification::is_error)
            .map(|notification| notification.message().to_string())
            .collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn success(&self, message: &str) {
        self.seen
            .lock()
            .expect("notifier lock")
            .push(Notification::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.seen
            .lock()
            .expect("notifier lock")
            .push(Notification::Error(message.to_string()));
    }
}

/// Memory store that logs every mutation in call order.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemorySettingsStore,
    ops: StdMutex<Vec<String>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().expect("ops lock").clone()
    }

    pub fn forget_ops(&self) {
        self.ops.lock().expect("ops lock").clear();
    }

    fn record(&self, op: String) {
        self.ops.lock().expect("ops lock").push(op);
    }
}

#[async_trait]
impl SettingsStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.record(format!("set {key}"));
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.record(format!("remove {key}"));
        self.inner.remove(key).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.record("clear".to_string());
        self.inner.clear().await
    }
}

pub struct Harness {
    pub store: Arc<RecordingStore>,
    pub remote: Arc<ScriptedRemote>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: RecordingStore::new(),
            remote: ScriptedRemote::new(),
            notifier: RecordingNotifier::new(),
        }
    }

    pub fn dependencies(&self) -> OptionsDependencies {
        OptionsDependencies::new(
            self.store.clone(),
            self.remote.clone(),
            self.notifier.clone(),
        )
    }

    pub async fn controller(&self) -> OptionsController {
        OptionsController::initialize(self.dependencies(), OptionsDefaults::default())
            .await
            .expect("initialize controller")
    }

    pub async fn stored(&self, key: &str) -> Option<Value> {
        self.store.get(key).await.expect("store get")
    }

    pub async fn seed(&self, key: &str, value: Value) {
        self.store.set(key, value).await.expect("seed");
        self.store.forget_ops();
    }
}
