use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const WRAPPER_PREFIX: &str = "<v xml:space=";
const WRAPPER_SUFFIX: &str = "</v>";

/// Field holding the event timestamp.
pub const TIME_FIELD: &str = "_time";

/// Field holding the segmented raw event body.
pub const RAW_FIELD: &str = "_raw";

/// One streamed result row, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Keyed field access.
    ///
    /// Multi-valued fields are joined with newlines and non-string scalars are
    /// rendered as JSON text. Missing and null fields yield `None`.
    pub fn field(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Array(values) => Some(
                values
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            other => Some(other.to_string()),
        }
    }

    /// The segmented raw body, empty when the row has none.
    pub fn segmented_raw(&self) -> String {
        self.field(RAW_FIELD).unwrap_or_default()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// A normalized search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub sequence_number: u64,
    pub timestamp: String,
    pub text: String,
}

impl SearchRecord {
    /// `"{sequence}-{timestamp}"`, the label shown next to each event.
    pub fn label(&self) -> String {
        format!("{}-{}", self.sequence_number, self.timestamp)
    }
}

/// Normalize a raw row into a [`SearchRecord`] numbered `counter`.
///
/// The timestamp is passed through untouched. The body is trimmed and the
/// `<v xml:space=...>` / `</v>` wrapper removed where present; either half is
/// stripped independently of the other. Missing fields degrade to empty strings.
pub fn parse_record(raw: &RawRecord, counter: u64) -> SearchRecord {
    SearchRecord {
        sequence_number: counter,
        timestamp: raw.field(TIME_FIELD).unwrap_or_default(),
        text: strip_wrapper(&raw.segmented_raw()).to_string(),
    }
}

fn strip_wrapper(body: &str) -> &str {
    let mut text = body.trim();

    if text.starts_with(WRAPPER_PREFIX) {
        if let Some(close) = text.find('>') {
            text = &text[close + 1..];
        }
    }

    if let Some(inner) = text.strip_suffix(WRAPPER_SUFFIX) {
        text = inner;
    }

    text
}
