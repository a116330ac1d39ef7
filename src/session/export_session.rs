use crate::client::transport::Transport;
use crate::export::query::SearchQuery;
use crate::export::record::{parse_record, SearchRecord};
use crate::export::stream::ExportStream;
use crate::session::state::{SessionError, SessionOutcome, SessionState};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

enum LoopExit {
    Final,
    Cancelled,
}

/// Collects the full result of one query by re-issuing export requests until
/// the server reports the final segment.
///
/// Cancellation is cooperative and observed only between streams: a stream
/// that is being drained when cancellation is requested is drained to the end
/// before the session stops, and no further request is issued. If that stream
/// turns out to be final the session still completes.
pub struct SearchExportSession {
    id: Uuid,
    query: SearchQuery,
    transport: Arc<dyn Transport>,
    cancel: CancellationToken,
    state: SessionState,
    stream: Option<ExportStream>,
    records: Vec<SearchRecord>,
    counter: u64,
    streams_opened: u32,
}

impl SearchExportSession {
    pub fn new(query: SearchQuery, transport: Arc<dyn Transport>) -> Self {
        Self::with_cancellation(query, transport, CancellationToken::new())
    }

    pub fn with_cancellation(
        query: SearchQuery,
        transport: Arc<dyn Transport>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            query,
            transport,
            cancel,
            state: SessionState::Idle,
            stream: None,
            records: Vec::new(),
            counter: 0,
            streams_opened: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Token that stops the session at the next stream boundary when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Number of export requests that returned a stream.
    pub fn streams_opened(&self) -> u32 {
        self.streams_opened
    }

    /// Records received so far, including any later discarded.
    pub fn records_seen(&self) -> u64 {
        self.counter
    }

    /// Run the export loop to a terminal state.
    ///
    /// Only valid from `Idle`; call [`acknowledge`](Self::acknowledge) after a
    /// terminal state to run again.
    pub async fn run(&mut self) -> SessionOutcome {
        if self.state != SessionState::Idle {
            return SessionOutcome::Failed(SessionError::InvalidState(self.state));
        }

        info!(
            session_id = %self.id,
            search = %self.query.text(),
            earliest = ?self.query.earliest_time(),
            latest = ?self.query.latest_time(),
            "Starting search export session"
        );

        let result = self.export_loop().await;
        self.close_stream().await;

        let outcome = match result {
            Ok(LoopExit::Final) => {
                info!(
                    session_id = %self.id,
                    records = self.records.len(),
                    streams = self.streams_opened,
                    "Search export completed"
                );
                SessionOutcome::Completed(std::mem::take(&mut self.records))
            }
            Ok(LoopExit::Cancelled) => {
                info!(
                    session_id = %self.id,
                    discarded = self.records.len(),
                    streams = self.streams_opened,
                    "Search export cancelled"
                );
                self.records.clear();
                SessionOutcome::Cancelled
            }
            Err(e) => {
                error!(
                    session_id = %self.id,
                    discarded = self.records.len(),
                    streams = self.streams_opened,
                    error = %e,
                    "Search export failed"
                );
                self.records.clear();
                SessionOutcome::Failed(e)
            }
        };

        self.transition(outcome.state());
        outcome
    }

    /// Return a terminal session to `Idle`, clearing its counters.
    pub fn acknowledge(&mut self) {
        if self.state.is_terminal() {
            self.records.clear();
            self.counter = 0;
            self.streams_opened = 0;
            self.transition(SessionState::Idle);
        }
    }

    async fn export_loop(&mut self) -> Result<LoopExit, SessionError> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(LoopExit::Cancelled);
            }

            if self.state == SessionState::Idle {
                self.transition(SessionState::Submitting);
            }

            let stream = ExportStream::open(&self.query, self.transport.as_ref()).await?;
            self.streams_opened += 1;
            self.stream = Some(stream);
            self.transition(SessionState::Streaming);

            self.drain_stream().await?;

            let is_final = self.stream.as_ref().is_some_and(|s| s.is_final());
            self.close_stream().await;

            if is_final {
                return Ok(LoopExit::Final);
            }

            debug!(
                session_id = %self.id,
                segment = self.streams_opened,
                records = self.counter,
                "Export segment not final, re-issuing request"
            );
        }
    }

    async fn drain_stream(&mut self) -> Result<(), SessionError> {
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Ok(()),
        };

        while let Some(raw) = stream.next_raw().await? {
            self.counter += 1;
            self.records.push(parse_record(&raw, self.counter));
        }

        Ok(())
    }

    async fn close_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close().await;
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!(session_id = %self.id, from = %self.state, to = %next, "Session state change");
            self.state = next;
        }
    }
}

impl std::fmt::Debug for SearchExportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchExportSession")
            .field("id", &self.id)
            .field("query", &self.query)
            .field("state", &self.state)
            .field("records", &self.records.len())
            .field("streams_opened", &self.streams_opened)
            .finish()
    }
}
