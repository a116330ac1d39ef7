use crate::client::transport::Transport;
use crate::export::query::{SearchQuery, TimeRange};
use crate::session::{SearchExportSession, SessionOutcome};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Transient state signalled to presentation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerStatus {
    Idle,
    Searching,
    Cancelling,
}

/// Terminal report for one submission.
#[derive(Debug)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub query: SearchQuery,
    pub outcome: SessionOutcome,
}

struct ActiveSession {
    id: Uuid,
    query: SearchQuery,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the single active export session and relays its outcome.
///
/// Status changes go out on a watch channel; each submission produces exactly
/// one [`SessionReport`] on the report channel, including superseded ones.
pub struct SessionController {
    transport: Arc<dyn Transport>,
    status_tx: Arc<watch::Sender<ControllerStatus>>,
    report_tx: mpsc::Sender<SessionReport>,
    active: Option<ActiveSession>,
}

impl SessionController {
    pub fn new(transport: Arc<dyn Transport>, report_tx: mpsc::Sender<SessionReport>) -> Self {
        let (status_tx, _) = watch::channel(ControllerStatus::Idle);
        Self {
            transport,
            status_tx: Arc::new(status_tx),
            report_tx,
            active: None,
        }
    }

    pub fn status(&self) -> ControllerStatus {
        *self.status_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerStatus> {
        self.status_tx.subscribe()
    }

    /// Whether a submitted session has not yet reached a terminal state.
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    /// Start a new session for `query_text`, superseding any running one.
    ///
    /// The `search` verb is prefixed when missing. Returns the new session's id.
    pub async fn submit(&mut self, query_text: &str, time_range: TimeRange) -> Uuid {
        self.abort().await;

        let query = SearchQuery::new(query_text, time_range);
        let cancel = CancellationToken::new();
        let mut session = SearchExportSession::with_cancellation(
            query.clone(),
            Arc::clone(&self.transport),
            cancel.clone(),
        );
        let id = session.id();

        self.status_tx.send_replace(ControllerStatus::Searching);
        info!(session_id = %id, search = %query.text(), "Search submitted");

        let status_tx = Arc::clone(&self.status_tx);
        let report_tx = self.report_tx.clone();
        let report_query = query.clone();
        let handle = tokio::spawn(async move {
            let outcome = session.run().await;
            status_tx.send_replace(ControllerStatus::Idle);
            let report = SessionReport {
                session_id: id,
                query: report_query,
                outcome,
            };
            if report_tx.send(report).await.is_err() {
                warn!(session_id = %id, "Report channel closed, dropping session outcome");
            }
        });

        self.active = Some(ActiveSession {
            id,
            query,
            cancel,
            handle,
        });
        id
    }

    /// Request cancellation of the running session.
    ///
    /// Takes effect at the next stream boundary. Returns false when nothing is running.
    pub fn cancel(&self) -> bool {
        match &self.active {
            Some(active) if !active.handle.is_finished() => {
                active.cancel.cancel();
                self.status_tx.send_replace(ControllerStatus::Cancelling);
                info!(session_id = %active.id, "Cancellation requested");
                true
            }
            _ => false,
        }
    }

    /// Wait for the running session, if any, to report.
    pub async fn wait(&mut self) {
        if let Some(active) = self.active.take() {
            if let Err(e) = active.handle.await {
                warn!(session_id = %active.id, error = %e, "Session task ended abnormally");
            }
        }
    }

    /// Force the running session into `Cancelled` without waiting for the next
    /// stream boundary.
    ///
    /// The session task is aborted outright, which drops (and so closes) any
    /// open export stream. A `Cancelled` report is sent for it. Submitting a new
    /// search does this to the previous one.
    pub async fn abort(&mut self) {
        let active = match self.active.take() {
            Some(active) => active,
            None => return,
        };

        if active.handle.is_finished() {
            return;
        }

        active.cancel.cancel();
        active.handle.abort();

        match active.handle.await {
            Ok(()) => {
                debug!(session_id = %active.id, "Session finished before abort");
            }
            Err(e) if e.is_cancelled() => {
                info!(session_id = %active.id, "Aborted running session");
                let report = SessionReport {
                    session_id: active.id,
                    query: active.query,
                    outcome: SessionOutcome::Cancelled,
                };
                if self.report_tx.send(report).await.is_err() {
                    warn!(session_id = %active.id, "Report channel closed, dropping session outcome");
                }
            }
            Err(e) => {
                warn!(session_id = %active.id, error = %e, "Aborted session panicked");
            }
        }

        self.status_tx.send_replace(ControllerStatus::Idle);
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            active.handle.abort();
        }
    }
}
