use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{watch, Mutex, MutexGuard};

use super::state::{Event, Phase};
use super::store::{SessionStore, TranscriptEntry};
use crate::client::{Backend, ClientError, FileUpload};
use crate::core::{ChatReply, InitAck, Message, SessionConfig, SessionSnapshot, UploadReceipt};

/// One rendered frame of the session, published after every committed change.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub phase: Phase,
    pub config: SessionConfig,
    pub snapshot: SessionSnapshot,
    pub transcript: Vec<TranscriptEntry>,
    pub loading: bool,
    pub uploading: bool,
    /// Last surfaced failure, cleared when the next action starts
    pub error: Option<String>,
    /// Non-error feedback such as the upload receipt
    pub notice: Option<String>,
}

struct Inner {
    phase: Phase,
    store: SessionStore,
    error: Option<String>,
    notice: Option<String>,
}

impl Inner {
    fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            config: self.store.config().clone(),
            snapshot: self.store.snapshot().clone(),
            transcript: self.store.transcript(),
            loading: self.store.loading(),
            uploading: self.store.uploading(),
            error: self.error.clone(),
            notice: self.notice.clone(),
        }
    }

    fn apply(&mut self, event: Event) -> Result<(), ClientError> {
        let next = self.phase.next(event)?;
        if next != self.phase {
            tracing::debug!("Session phase {} -> {}", self.phase, next);
        }
        self.phase = next;
        Ok(())
    }

    fn surface(&mut self, err: &ClientError) {
        self.error = Some(err.to_string());
    }
}

/// Owns the client's view of the backend session and keeps it in step with
/// the backend.
///
/// Only one backend call that can change the session runs at a time; actions
/// that arrive meanwhile are rejected with [`ClientError::Busy`]. The lock is
/// released while a request is in flight so readers always see the last
/// committed frame.
pub struct SessionController<B> {
    backend: B,
    inner: Mutex<Inner>,
    updates: watch::Sender<SessionView>,
    live: AtomicBool,
}

impl<B: Backend> SessionController<B> {
    pub fn new(backend: B, config: SessionConfig) -> Self {
        let inner = Inner {
            phase: Phase::Uninitialized,
            store: SessionStore::new(config),
            error: None,
            notice: None,
        };
        let (updates, _) = watch::channel(inner.view());

        Self {
            backend,
            inner: Mutex::new(inner),
            updates,
            live: AtomicBool::new(true),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.updates.subscribe()
    }

    /// Last committed frame
    pub fn view(&self) -> SessionView {
        self.updates.borrow().clone()
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Tear down the view. Requests still in flight are not aborted, but
    /// their results are discarded when they land.
    pub fn detach(&self) {
        if self.live.swap(false, Ordering::AcqRel) {
            tracing::debug!("Session controller detached");
        }
    }

    /// Edit the setup form. Only allowed before the init request goes out.
    pub async fn update_config(
        &self,
        edit: impl FnOnce(&mut SessionConfig),
    ) -> Result<SessionConfig, ClientError> {
        let mut inner = self.lock_live().await?;
        match inner.phase {
            Phase::Uninitialized => {}
            phase if phase.is_in_flight() => return Err(ClientError::Busy(phase.as_str())),
            _ => return Err(ClientError::AlreadyInitialized),
        }

        let mut config = inner.store.config().clone();
        edit(&mut config);
        inner.store.set_config(config.clone());
        self.publish(&inner);
        Ok(config)
    }

    /// Mount-time state check. A failed fetch is logged and leaves the
    /// session on the setup step rather than surfacing an error.
    pub async fn check_state(&self) -> Result<Phase, ClientError> {
        self.begin(Event::CheckState, |inner| inner.store.set_loading(true))
            .await?;

        let state = self.backend.fetch_state().await;

        let mut inner = self.settle().await?;
        inner.store.set_loading(false);
        match state {
            Ok(snapshot) => {
                inner.apply(Event::StateLoaded {
                    initialized: snapshot.initialized,
                })?;
                inner.store.set_snapshot(snapshot);
            }
            Err(err) => {
                tracing::warn!("Could not load session state, showing setup: {}", err);
                inner.apply(Event::StateFailed)?;
            }
        }
        self.publish(&inner);

        tracing::info!("Session state checked: {}", inner.phase);
        Ok(inner.phase)
    }

    /// Send the (now frozen) config to the backend, then load the new session.
    pub async fn initialize(&self) -> Result<InitAck, ClientError> {
        let config = self
            .begin(Event::SubmitConfig, |inner| {
                inner.store.set_loading(true);
                inner.store.config().clone()
            })
            .await?;

        tracing::info!(
            "Initializing session: container {} on port {}, model {}",
            config.container_name,
            config.port,
            config.model
        );

        let ack = match self.backend.init_session(&config).await {
            Ok(ack) => ack,
            Err(err) => {
                let mut inner = self.settle().await?;
                inner.store.set_loading(false);
                inner.apply(Event::InitFailed)?;
                inner.surface(&err);
                self.publish(&inner);
                return Err(err);
            }
        };

        if !self.is_live() {
            tracing::debug!("Dropping init result for a detached session");
            return Err(ClientError::Detached);
        }
        let state = self.backend.fetch_state().await;

        let mut inner = self.settle().await?;
        inner.store.set_loading(false);
        let result = match state {
            Ok(snapshot) if snapshot.initialized => {
                inner.apply(Event::StateLoaded { initialized: true })?;
                inner.store.set_snapshot(snapshot);
                inner.notice = ack.message.clone();
                Ok(ack)
            }
            Ok(_) => {
                inner.apply(Event::StateLoaded { initialized: false })?;
                let err = ClientError::Network(
                    "backend accepted the config but reports no initialized session".to_string(),
                );
                inner.surface(&err);
                Err(err)
            }
            Err(err) => {
                inner.apply(Event::StateFailed)?;
                inner.surface(&err);
                Err(err)
            }
        };
        self.publish(&inner);

        if result.is_ok() {
            tracing::info!("Session ready");
        }
        result
    }

    /// Send one user turn. The turn shows up immediately as a pending entry;
    /// on success the backend's list replaces the whole transcript, on failure
    /// the entry stays, marked unconfirmed.
    pub async fn send_message(&self, content: &str) -> Result<ChatReply, ClientError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyInput);
        }

        self.begin(Event::SubmitMessage, |inner| {
            inner.store.append_optimistic(Message::user(content));
            inner.store.set_loading(true);
        })
        .await?;

        let result = self.backend.send_message(content).await;

        let mut inner = self.settle().await?;
        inner.store.set_loading(false);
        inner.apply(Event::SendResolved)?;
        match &result {
            Ok(reply) => {
                let snapshot = inner.store.snapshot().after_chat(reply);
                inner.store.set_snapshot(snapshot);
            }
            Err(err) => {
                inner.store.mark_unconfirmed();
                inner.surface(err);
            }
        }
        self.publish(&inner);
        result
    }

    pub async fn upload_files(&self, files: Vec<FileUpload>) -> Result<UploadReceipt, ClientError> {
        if files.is_empty() {
            return Err(ClientError::EmptyInput);
        }

        self.begin(Event::SelectFiles, |inner| inner.store.set_uploading(true))
            .await?;

        let result = self.backend.upload_files(files).await;

        let mut inner = self.settle().await?;
        inner.store.set_uploading(false);
        inner.apply(Event::UploadResolved)?;
        match &result {
            Ok(receipt) => {
                inner.notice = Some(upload_notice(receipt));
            }
            Err(err) => inner.surface(err),
        }
        self.publish(&inner);
        result
    }

    /// Re-read the backend session and replace the snapshot wholesale.
    pub async fn refresh(&self) -> Result<Phase, ClientError> {
        self.begin(Event::Refresh, |inner| inner.store.set_loading(true))
            .await?;

        let state = self.backend.fetch_state().await;

        let mut inner = self.settle().await?;
        inner.store.set_loading(false);
        let result = match state {
            Ok(snapshot) => {
                if !snapshot.initialized {
                    tracing::warn!("Backend no longer reports an initialized session");
                }
                inner.apply(Event::StateLoaded {
                    initialized: snapshot.initialized,
                })?;
                inner.store.set_snapshot(snapshot);
                Ok(inner.phase)
            }
            Err(err) => {
                inner.apply(Event::StateFailed)?;
                inner.surface(&err);
                Err(err)
            }
        };
        self.publish(&inner);
        result
    }

    async fn lock_live(&self) -> Result<MutexGuard<'_, Inner>, ClientError> {
        let inner = self.inner.lock().await;
        if !self.is_live() {
            return Err(ClientError::Detached);
        }
        Ok(inner)
    }

    /// Start an action: validate the transition, clear old feedback, apply
    /// the local side of the action and publish it. Nothing changes when the
    /// transition is refused.
    async fn begin<T>(
        &self,
        event: Event,
        prepare: impl FnOnce(&mut Inner) -> T,
    ) -> Result<T, ClientError> {
        let mut inner = self.lock_live().await?;
        inner.apply(event)?;
        inner.error = None;
        inner.notice = None;
        let value = prepare(&mut inner);
        self.publish(&inner);
        Ok(value)
    }

    /// Re-take the lock once a backend call resolved. Detached controllers
    /// drop the result.
    async fn settle(&self) -> Result<MutexGuard<'_, Inner>, ClientError> {
        self.lock_live().await.inspect_err(|_| {
            tracing::debug!("Dropping late backend result for a detached session");
        })
    }

    fn publish(&self, inner: &Inner) {
        self.updates.send_replace(inner.view());
    }
}

fn upload_notice(receipt: &UploadReceipt) -> String {
    if receipt.uploaded.is_empty() {
        return "Upload finished, backend reported no files".to_string();
    }
    format!(
        "Uploaded {} file(s):\n{}",
        receipt.uploaded.len(),
        receipt.uploaded.join("\n")
    )
}
