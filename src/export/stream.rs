use crate::client::error::{Message, Result};
use crate::client::transport::Transport;
use crate::export::query::SearchQuery;
use crate::export::record::RawRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// One line of an export response.
///
/// Lines carrying `result` are records; the rest are control lines. Every
/// line's `preview` flag says whether more output will follow for this job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportLine {
    #[serde(default)]
    pub preview: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default)]
    pub lastrow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RawRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

impl ExportLine {
    pub fn record(preview: bool, result: RawRecord) -> Self {
        Self {
            preview,
            result: Some(result),
            ..Default::default()
        }
    }

    pub fn control(preview: bool) -> Self {
        Self {
            preview,
            ..Default::default()
        }
    }
}

/// Pull-based source of export lines bound to one live response.
///
/// Implementations must read no further than the next line and release the
/// underlying connection on `close` (and on drop).
#[async_trait]
pub trait RecordSource: Send {
    /// Fetch the next line, or `None` once the response has ended.
    async fn next_line(&mut self) -> Result<Option<ExportLine>>;

    /// Release the underlying connection. Must be idempotent.
    async fn close(&mut self);
}

/// A single export response consumed as a forward-only sequence of raw records.
pub struct ExportStream {
    source: Option<Box<dyn RecordSource>>,
    last_preview: Option<bool>,
    drained: bool,
    records_read: u64,
}

impl ExportStream {
    pub fn new(source: Box<dyn RecordSource>) -> Self {
        Self {
            source: Some(source),
            last_preview: None,
            drained: false,
            records_read: 0,
        }
    }

    /// Issue an export request for `query` and wrap the response.
    pub async fn open(query: &SearchQuery, transport: &dyn Transport) -> Result<Self> {
        transport.export_search(query).await
    }

    /// Pull the next raw record, skipping control lines.
    ///
    /// Returns `None` at end of stream; the connection is released at that
    /// point. Any read error also releases the connection before returning.
    pub async fn next_raw(&mut self) -> Result<Option<RawRecord>> {
        loop {
            let source = match self.source.as_mut() {
                Some(source) => source,
                None => return Ok(None),
            };

            let line = match source.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.drained = true;
                    debug!(
                        records = self.records_read,
                        is_final = self.is_final(),
                        "Export stream drained"
                    );
                    self.close().await;
                    return Ok(None);
                }
                Err(e) => {
                    self.close().await;
                    return Err(e);
                }
            };

            self.last_preview = Some(line.preview);
            log_messages(&line.messages);

            if let Some(record) = line.result {
                self.records_read += 1;
                trace!(
                    offset = ?line.offset,
                    preview = line.preview,
                    lastrow = line.lastrow,
                    "Read export record"
                );
                return Ok(Some(record));
            }
        }
    }

    /// Whether the server marked this response as the last segment of the job.
    ///
    /// Only meaningful once the stream has been drained; before that, and for a
    /// response that carried no lines at all, this is `false`.
    pub fn is_final(&self) -> bool {
        self.drained && self.last_preview == Some(false)
    }

    pub fn is_drained(&self) -> bool {
        self.drained
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Release the underlying connection. Safe to call repeatedly.
    pub async fn close(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close().await;
            trace!(records = self.records_read, "Export stream closed");
        }
    }
}

impl Drop for ExportStream {
    fn drop(&mut self) {
        if self.source.is_some() {
            debug!(
                records = self.records_read,
                "ExportStream dropped without explicit close"
            );
        }
    }
}

impl std::fmt::Debug for ExportStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportStream")
            .field("closed", &self.is_closed())
            .field("drained", &self.drained)
            .field("last_preview", &self.last_preview)
            .field("records_read", &self.records_read)
            .finish()
    }
}

fn log_messages(messages: &[Message]) {
    for message in messages {
        if message.is_error() {
            warn!(severity = %message.severity, text = %message.text, "Server message on export stream");
        } else {
            debug!(severity = %message.severity, text = %message.text, "Server message on export stream");
        }
    }
}
