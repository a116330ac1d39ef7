#![allow(dead_code)]

use async_trait::async_trait;
use search_export::client::error::Result;
use search_export::client::{Message, Namespace, SessionToken, Transport, TransportError};
use search_export::export::{ExportLine, ExportStream, RawRecord, RecordSource, SearchQuery};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// One scripted response to an export request.
pub enum Segment {
    Records {
        records: Vec<(&'static str, &'static str)>,
        is_final: bool,
        /// Cancel this token when the n-th line of the stream is read.
        cancel_at: Option<(usize, CancellationToken)>,
    },
    /// A stream that never ends.
    Hang,
    /// Preview records followed by an undecodable line.
    Broken {
        records: Vec<(&'static str, &'static str)>,
        line: &'static str,
    },
    /// The export request itself fails.
    Fail { status: u16, text: &'static str },
}

impl Segment {
    pub fn partial(records: Vec<(&'static str, &'static str)>) -> Self {
        Segment::Records {
            records,
            is_final: false,
            cancel_at: None,
        }
    }

    pub fn last(records: Vec<(&'static str, &'static str)>) -> Self {
        Segment::Records {
            records,
            is_final: true,
            cancel_at: None,
        }
    }
}

pub fn raw(time: &str, body: &str) -> RawRecord {
    match json!({ "_time": time, "_raw": body }) {
        Value::Object(map) => RawRecord::new(map),
        _ => unreachable!(),
    }
}

struct ScriptedSource {
    lines: VecDeque<ExportLine>,
    hang: bool,
    error: Option<TransportError>,
    cancel_at: Option<(usize, CancellationToken)>,
    read: usize,
    released: Arc<AtomicUsize>,
}

#[async_trait]
impl RecordSource for ScriptedSource {
    async fn next_line(&mut self) -> Result<Option<ExportLine>> {
        if let Some((at, token)) = &self.cancel_at {
            if self.read == *at {
                token.cancel();
            }
        }
        self.read += 1;

        if self.lines.is_empty() {
            if let Some(error) = self.error.take() {
                return Err(error);
            }
            if self.hang {
                futures::future::pending::<()>().await;
            }
        }
        Ok(self.lines.pop_front())
    }

    async fn close(&mut self) {}
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Transport that answers export requests from a fixed script.
pub struct ScriptedTransport {
    segments: Mutex<VecDeque<Segment>>,
    opens: AtomicUsize,
    released: Arc<AtomicUsize>,
    queries: Mutex<Vec<SearchQuery>>,
}

impl ScriptedTransport {
    pub fn new(segments: Vec<Segment>) -> Arc<Self> {
        Arc::new(Self {
            segments: Mutex::new(segments.into()),
            opens: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
            queries: Mutex::new(Vec::new()),
        })
    }

    /// Export requests that reached the transport, failed ones included.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Streams whose underlying source has been released.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn login(&self, _username: &str, _password: &str) -> Result<SessionToken> {
        Ok(SessionToken::new("scripted"))
    }

    async fn export_search(&self, query: &SearchQuery) -> Result<ExportStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());

        let segment = self.segments.lock().unwrap().pop_front();
        let mut error = None;
        let (lines, hang, cancel_at) = match segment {
            Some(Segment::Records {
                records,
                is_final,
                cancel_at,
            }) => {
                let mut lines: VecDeque<ExportLine> = records
                    .into_iter()
                    .map(|(time, body)| ExportLine::record(!is_final, raw(time, body)))
                    .collect();
                lines.push_back(ExportLine::control(!is_final));
                (lines, false, cancel_at)
            }
            Some(Segment::Hang) => (VecDeque::new(), true, None),
            Some(Segment::Broken { records, line }) => {
                error = serde_json::from_str::<ExportLine>(line)
                    .err()
                    .map(TransportError::Decode);
                let lines = records
                    .into_iter()
                    .map(|(time, body)| ExportLine::record(true, raw(time, body)))
                    .collect();
                (lines, false, None)
            }
            Some(Segment::Fail { status, text }) => {
                return Err(TransportError::from_status(
                    status,
                    "Scripted Failure",
                    vec![Message::new("FATAL", text)],
                ));
            }
            None => {
                return Err(TransportError::from_status(
                    500,
                    "Internal Server Error",
                    vec![Message::new("ERROR", "script exhausted")],
                ));
            }
        };

        Ok(ExportStream::new(Box::new(ScriptedSource {
            lines,
            hang,
            error,
            cancel_at,
            read: 0,
            released: Arc::clone(&self.released),
        })))
    }

    async fn get_document(
        &self,
        _namespace: &Namespace,
        _resource: &str,
        _params: &[(&str, String)],
    ) -> Result<Value> {
        Ok(json!({}))
    }

    async fn post(
        &self,
        _namespace: &Namespace,
        _resource: &str,
        _params: &[(&str, String)],
    ) -> Result<Value> {
        Ok(json!({}))
    }
}
