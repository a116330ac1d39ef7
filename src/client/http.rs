use crate::client::error::{MessagesDocument, Result, TransportError};
use crate::client::export_source::HttpRecordSource;
use crate::client::namespace::Namespace;
use crate::client::transport::{SessionToken, Transport};
use crate::config::types::ServerConfig;
use crate::export::query::SearchQuery;
use crate::export::stream::ExportStream;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

const LOGIN_RESOURCE: &str = "auth/login";
const EXPORT_RESOURCE: &str = "search/jobs/export";
const OUTPUT_MODE: (&str, &str) = ("output_mode", "json");

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "sessionKey")]
    session_key: Option<String>,
}

/// HTTP client for the search service's REST API
///
/// Document requests are bounded by the configured timeout as a whole. Export
/// responses may stream for as long as the job runs, so they use a client that
/// only bounds connection setup.
#[derive(Debug)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
    stream_client: reqwest::Client,
    namespace: Namespace,
    session_key: RwLock<Option<String>>,
}

impl HttpTransport {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let root_cert = match &config.ca_cert {
            Some(path) => {
                let pem = std::fs::read(path).map_err(|e| TransportError::Certificate {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                Some(reqwest::Certificate::from_pem(&pem)?)
            }
            None => None,
        };

        let builder = || {
            let builder = reqwest::Client::builder()
                .danger_accept_invalid_certs(config.accept_invalid_certs);
            match &root_cert {
                Some(cert) => builder.add_root_certificate(cert.clone()),
                None => builder,
            }
        };

        Ok(Self {
            base_url: config.base_url(),
            client: builder().timeout(config.timeout).build()?,
            stream_client: builder().connect_timeout(config.timeout).build()?,
            namespace: Namespace::default(),
            session_key: RwLock::new(None),
        })
    }

    /// Address exports under `namespace` instead of the default `services` root.
    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn session_key(&self) -> Option<SessionToken> {
        self.session_key.read().await.clone().map(SessionToken::new)
    }

    /// Reuse a session token obtained elsewhere instead of logging in.
    pub async fn set_session_key(&self, token: &SessionToken) {
        *self.session_key.write().await = Some(token.as_str().to_string());
    }

    fn services_url(&self, namespace: &Namespace, resource: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            namespace,
            resource.trim_start_matches('/')
        )
    }

    async fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session_key.read().await.as_deref() {
            Some(key) => request.header(reqwest::header::AUTHORIZATION, format!("Splunk {}", key)),
            None => request,
        }
    }

    /// Turn a non-success response into a `TransportError` carrying the server's messages.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::from_status(
            status.as_u16(),
            reason,
            MessagesDocument::parse(&body),
        ))
    }

    async fn read_document(response: reqwest::Response) -> Result<Value> {
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn login(&self, username: &str, password: &str) -> Result<SessionToken> {
        let url = self.services_url(&Namespace::default(), LOGIN_RESOURCE);
        debug!(url = %url, username = %username, "Logging in");

        let params = [
            ("username", username),
            ("password", password),
            OUTPUT_MODE,
        ];
        let response = self.client.post(&url).form(&params).send().await?;
        let document = Self::read_document(response).await?;

        let login: LoginResponse = serde_json::from_value(document)?;
        let key = login.session_key.ok_or(TransportError::MissingSessionKey)?;

        *self.session_key.write().await = Some(key.clone());
        info!(base_url = %self.base_url, username = %username, "Logged in");
        Ok(SessionToken::new(key))
    }

    async fn export_search(&self, query: &SearchQuery) -> Result<ExportStream> {
        let url = self.services_url(&self.namespace, EXPORT_RESOURCE);
        let mut params = query.export_params();
        params.push((OUTPUT_MODE.0, OUTPUT_MODE.1.to_string()));

        debug!(
            url = %url,
            search = %query.text(),
            earliest = ?query.earliest_time(),
            latest = ?query.latest_time(),
            "Opening export stream"
        );

        let request = self
            .authorize(self.stream_client.get(&url).query(&params))
            .await;
        let response = Self::check_status(request.send().await?).await?;

        let source = HttpRecordSource::new(Box::pin(response.bytes_stream()));
        Ok(ExportStream::new(Box::new(source)))
    }

    async fn get_document(
        &self,
        namespace: &Namespace,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<Value> {
        let url = self.services_url(namespace, resource);
        debug!(url = %url, "GET document");

        let request = self
            .client
            .get(&url)
            .query(params)
            .query(&[OUTPUT_MODE]);
        let response = self.authorize(request).await.send().await?;
        Self::read_document(response).await
    }

    async fn post(
        &self,
        namespace: &Namespace,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<Value> {
        let url = self.services_url(namespace, resource);
        debug!(url = %url, "POST document");

        let mut form: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        form.push(OUTPUT_MODE);

        let request = self.client.post(&url).form(&form);
        let response = self.authorize(request).await.send().await?;
        Self::read_document(response).await
    }
}
