//! Client-side project state with debounced write-back.
//!
//! A [`SyncClient`] owns the in-memory copy of one project. Mutations land
//! in memory at once and mark the pending-write slot; a background writer
//! waits for a quiet window (trailing edge, reset by every mutation) and then
//! drains the slot into a single `update_project` carrying the full
//! snapshot. Local state is authoritative: a failed write is logged and
//! dropped, never retried or rolled back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::error::Result;
use crate::store::ProjectStore;
use crate::types::{ChatMessage, Project, ProjectPatch, Sender, Status};

/// Quiet window used when none is configured.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1000);

struct Shared {
    project: Project,
    /// Latest snapshot waiting to be written.
    pending: Option<Project>,
    last_message_id: i64,
}

enum Signal {
    Changed,
    Flush(oneshot::Sender<Result<()>>),
}

pub struct SyncClient {
    shared: Arc<Mutex<Shared>>,
    signals: mpsc::UnboundedSender<Signal>,
}

impl SyncClient {
    /// Load `id` with a single `get_project` and start the writer.
    ///
    /// Any failure (unknown id, unreachable store) is returned as-is; the
    /// caller is expected to send the user back to the project list.
    pub async fn activate(
        store: Arc<dyn ProjectStore>,
        id: &str,
        window: Duration,
    ) -> Result<Self> {
        let project = store.get_project(id).await?;
        tracing::debug!(id, "project loaded");
        Ok(Self::start(store, project, window))
    }

    /// Start from an already-loaded project. Must be called inside a Tokio
    /// runtime.
    pub fn start(store: Arc<dyn ProjectStore>, project: Project, window: Duration) -> Self {
        let last_message_id = project
            .chat_history
            .iter()
            .map(|m| m.id)
            .max()
            .unwrap_or(0);
        let shared = Arc::new(Mutex::new(Shared {
            project,
            pending: None,
            last_message_id,
        }));
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(store, shared.clone(), window, rx));
        Self {
            shared,
            signals: tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        lock(&self.shared)
    }

    /// Apply `f` to the in-memory project and schedule a write.
    fn mutate<R>(&self, f: impl FnOnce(&mut Shared) -> R) -> R {
        let out = {
            let mut shared = self.lock();
            let out = f(&mut shared);
            shared.pending = Some(shared.project.clone());
            out
        };
        // The writer only goes away with the runtime.
        let _ = self.signals.send(Signal::Changed);
        out
    }

    pub fn snapshot(&self) -> Project {
        self.lock().project.clone()
    }

    pub fn status(&self) -> Status {
        self.lock().project.status
    }

    /// True while a snapshot is waiting for its quiet window.
    pub fn has_pending_write(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Append a chat message. Ids are millisecond timestamps forced to be
    /// strictly increasing, so rapid appends keep their order.
    pub fn push_chat(&self, sender: Sender, text: impl Into<String>) -> ChatMessage {
        let text = text.into();
        self.mutate(|s| {
            let now = chrono::Utc::now().timestamp_millis();
            let id = now.max(s.last_message_id + 1);
            s.last_message_id = id;
            let msg = ChatMessage { id, sender, text };
            s.project.chat_history.push(msg.clone());
            msg
        })
    }

    pub fn push_log(&self, line: impl Into<String>) {
        let line = line.into();
        self.mutate(|s| s.project.logs.push(line));
    }

    pub fn set_status(&self, status: Status) {
        self.mutate(|s| s.project.status = status);
    }

    /// Write the pending snapshot now instead of waiting for the window.
    /// Unlike debounced writes, the outcome is returned to the caller.
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        if self.signals.send(Signal::Flush(tx)).is_err() {
            return Ok(());
        }
        rx.await.unwrap_or(Ok(()))
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_writer(
    store: Arc<dyn ProjectStore>,
    shared: Arc<Mutex<Shared>>,
    window: Duration,
    mut signals: mpsc::UnboundedReceiver<Signal>,
) {
    while let Some(signal) = signals.recv().await {
        let mut reply = match signal {
            Signal::Changed => None,
            Signal::Flush(tx) => Some(tx),
        };

        if reply.is_none() {
            // Every further change inside the window restarts it.
            loop {
                match tokio::time::timeout(window, signals.recv()).await {
                    Ok(Some(Signal::Changed)) => continue,
                    Ok(Some(Signal::Flush(tx))) => {
                        reply = Some(tx);
                        break;
                    }
                    Ok(None) | Err(_) => break,
                }
            }
        }

        let result = write_pending(store.as_ref(), &shared).await;
        match reply {
            Some(tx) => {
                let _ = tx.send(result);
            }
            None => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "debounced project save failed; keeping local state");
                }
            }
        }
    }
}

async fn write_pending(store: &dyn ProjectStore, shared: &Mutex<Shared>) -> Result<()> {
    let pending = lock(shared).pending.take();
    let Some(project) = pending else {
        return Ok(());
    };
    tracing::debug!(
        id = %project.id,
        chat = project.chat_history.len(),
        logs = project.logs.len(),
        "saving project"
    );
    store
        .update_project(&project.id, ProjectPatch::snapshot(&project))
        .await?;
    Ok(())
}
