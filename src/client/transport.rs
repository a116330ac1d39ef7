use crate::client::error::Result;
use crate::client::namespace::Namespace;
use crate::export::query::SearchQuery;
use crate::export::stream::ExportStream;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Opaque session token returned by a successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Request/response capability against the remote search service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Authenticate and retain the session token for later requests.
    async fn login(&self, username: &str, password: &str) -> Result<SessionToken>;

    /// Open a streaming export of the results of `query`.
    async fn export_search(&self, query: &SearchQuery) -> Result<ExportStream>;

    async fn get_document(
        &self,
        namespace: &Namespace,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<Value>;

    async fn post(
        &self,
        namespace: &Namespace,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<Value>;
}
