use crate::client::namespace::Namespace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub credentials: Credentials,
    #[serde(default)]
    pub namespace: Namespace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub scheme: Scheme,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// PEM bundle of an additional trusted root (self-signed management certs).
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
}

fn default_port() -> u16 {
    8089
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl ServerConfig {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
            timeout: default_timeout(),
            accept_invalid_certs: false,
            ca_cert: None,
        }
    }

    /// `{scheme}://{host}:{port}`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let yaml = r#"
server:
  host: splunk.example.com
credentials:
  username: admin
  password: changeme
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.scheme, Scheme::Https);
        assert_eq!(config.server.port, 8089);
        assert_eq!(config.server.timeout, Duration::from_secs(30));
        assert!(!config.server.accept_invalid_certs);
        assert!(config.namespace.is_default());
        assert_eq!(config.server.base_url(), "https://splunk.example.com:8089");
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
server:
  scheme: http
  host: localhost
  port: 18089
  timeout: 2m
  accept_invalid_certs: true
credentials:
  username: admin
  password: changeme
namespace:
  owner: nobody
  app: search
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.base_url(), "http://localhost:18089");
        assert_eq!(config.server.timeout, Duration::from_secs(120));
        assert_eq!(config.namespace.to_string(), "servicesNS/nobody/search");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }
}
