use crate::client::error::{Result, TransportError};
use crate::export::stream::{ExportLine, RecordSource};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::trace;

/// Splits a streamed response body into newline-delimited export lines.
///
/// Holds at most one partial line plus the most recent body chunk; the next
/// chunk is only requested once the buffered bytes contain no complete line.
pub struct HttpRecordSource<S> {
    body: Option<S>,
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no newline.
    scanned: usize,
    body_ended: bool,
    lines_read: u64,
}

impl<S, B, E> HttpRecordSource<S>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + Unpin,
    B: AsRef<[u8]> + Send,
    E: Into<TransportError> + Send,
{
    pub fn new(body: S) -> Self {
        Self {
            body: Some(body),
            buffer: Vec::new(),
            scanned: 0,
            body_ended: false,
            lines_read: 0,
        }
    }

    fn take_buffered_line(&mut self) -> Option<Vec<u8>> {
        match self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let pos = self.scanned + offset;
                self.scanned = 0;
                Some(self.buffer.drain(..=pos).collect())
            }
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    fn decode(&mut self, line: &[u8]) -> Result<Option<ExportLine>> {
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            return Ok(None);
        }
        self.lines_read += 1;
        Ok(Some(serde_json::from_slice(trimmed)?))
    }
}

#[async_trait]
impl<S, B, E> RecordSource for HttpRecordSource<S>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + Unpin,
    B: AsRef<[u8]> + Send,
    E: Into<TransportError> + Send,
{
    async fn next_line(&mut self) -> Result<Option<ExportLine>> {
        loop {
            if let Some(line) = self.take_buffered_line() {
                match self.decode(&line)? {
                    Some(decoded) => return Ok(Some(decoded)),
                    None => continue,
                }
            }

            if self.body_ended {
                // Final line without a trailing newline
                let rest = std::mem::take(&mut self.buffer);
                self.scanned = 0;
                return self.decode(&rest);
            }

            let body = self.body.as_mut().ok_or(TransportError::Closed)?;
            match body.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => return Err(e.into()),
                None => self.body_ended = true,
            }
        }
    }

    async fn close(&mut self) {
        if self.body.take().is_some() {
            trace!(lines = self.lines_read, "Released export response body");
        }
        self.buffer.clear();
        self.scanned = 0;
    }
}
