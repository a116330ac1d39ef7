use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SEARCH_VERB: &str = "search ";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Optional earliest/latest bounds for a search.
///
/// Bounds are passed to the server verbatim, so both absolute timestamps and
/// relative modifiers (`-24h`, `now`) are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

impl TimeRange {
    /// No bounds: search across all time.
    pub fn all_time() -> Self {
        Self::default()
    }

    /// Absolute bounds, rendered in UTC without fractional seconds.
    pub fn between(earliest: DateTime<Utc>, latest: DateTime<Utc>) -> Self {
        Self {
            earliest: Some(earliest.format(TIME_FORMAT).to_string()),
            latest: Some(latest.format(TIME_FORMAT).to_string()),
        }
    }

    pub fn from_bounds(earliest: Option<String>, latest: Option<String>) -> Self {
        Self { earliest, latest }
    }

    pub fn is_all_time(&self) -> bool {
        self.earliest.is_none() && self.latest.is_none()
    }
}

/// An immutable search request: query text plus time bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    text: String,
    time_range: TimeRange,
}

impl SearchQuery {
    /// Build a query, prefixing the `search` verb unless it is already present.
    pub fn new(text: &str, time_range: TimeRange) -> Self {
        Self {
            text: build_query_text(text),
            time_range,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn time_range(&self) -> &TimeRange {
        &self.time_range
    }

    pub fn earliest_time(&self) -> Option<&str> {
        self.time_range.earliest.as_deref()
    }

    pub fn latest_time(&self) -> Option<&str> {
        self.time_range.latest.as_deref()
    }

    /// Query-string parameters for the export endpoint (without `output_mode`).
    pub fn export_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("search", self.text.clone())];
        if let Some(earliest) = &self.time_range.earliest {
            params.push(("earliest_time", earliest.clone()));
        }
        if let Some(latest) = &self.time_range.latest {
            params.push(("latest_time", latest.clone()));
        }
        params
    }
}

/// Trim the input and prefix `search ` when it does not already start with it
/// (case-insensitively).
pub fn build_query_text(text: &str) -> String {
    let trimmed = text.trim();
    let has_verb = trimmed
        .get(..SEARCH_VERB.len())
        .map(|head| head.eq_ignore_ascii_case(SEARCH_VERB))
        .unwrap_or(false);

    if has_verb {
        trimmed.to_string()
    } else {
        format!("{}{}", SEARCH_VERB, trimmed)
    }
}
