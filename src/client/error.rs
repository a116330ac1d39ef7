use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A diagnostic message returned by the server alongside a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type", default)]
    pub severity: String,
    #[serde(default)]
    pub text: String,
}

impl Message {
    pub fn new(severity: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            severity: severity.into(),
            text: text.into(),
        }
    }

    /// True for messages the server uses to report a failed operation.
    pub fn is_error(&self) -> bool {
        matches!(
            self.severity.to_ascii_uppercase().as_str(),
            "ERROR" | "FATAL"
        )
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.text)
    }
}

/// Envelope used by the server for the `messages` list of an error body.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MessagesDocument {
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl MessagesDocument {
    /// Extract the message list from an error body; anything unparseable yields no messages.
    pub fn parse(body: &str) -> Vec<Message> {
        serde_json::from_str::<MessagesDocument>(body)
            .map(|doc| doc.messages)
            .unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode server response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request failed with status {status} {reason}{}", format_messages(.messages))]
    RequestFailed {
        status: u16,
        reason: String,
        messages: Vec<Message>,
    },

    #[error("authentication failed with status {status} {reason}{}", format_messages(.messages))]
    AuthenticationFailure {
        status: u16,
        reason: String,
        messages: Vec<Message>,
    },

    #[error("failed to load certificate '{path}': {message}")]
    Certificate { path: String, message: String },

    #[error("login response did not contain a session key")]
    MissingSessionKey,

    #[error("export stream is closed")]
    Closed,
}

impl TransportError {
    /// Build the error for a non-success status, singling out rejected credentials.
    pub fn from_status(status: u16, reason: impl Into<String>, messages: Vec<Message>) -> Self {
        let reason = reason.into();
        if status == 401 {
            TransportError::AuthenticationFailure {
                status,
                reason,
                messages,
            }
        } else {
            TransportError::RequestFailed {
                status,
                reason,
                messages,
            }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::RequestFailed { status, .. }
            | TransportError::AuthenticationFailure { status, .. } => Some(*status),
            TransportError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        match self {
            TransportError::RequestFailed { messages, .. }
            | TransportError::AuthenticationFailure { messages, .. } => messages,
            _ => &[],
        }
    }

    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, TransportError::AuthenticationFailure { .. })
    }
}

fn format_messages(messages: &[Message]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let joined: Vec<String> = messages.iter().map(|m| m.to_string()).collect();
    format!(": {}", joined.join("; "))
}

pub type Result<T> = std::result::Result<T, TransportError>;
