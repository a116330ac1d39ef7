pub mod config;
pub mod info;
pub mod search;

use crate::client::transport::Transport;
use crate::client::{HttpTransport, TransportError};
use crate::config::{load_config, Config, ConfigError};
use crate::session::SessionError;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config not found; searched ~/.config/search-export/config.yml and /etc/search-export/config.yml.\nUse --config <path> to specify a config file, or run 'search-export config init' to generate one.")]
    ConfigNotFound,

    #[error("config file already exists at {}; remove it first or use --stdout", .0.display())]
    ConfigExists(PathBuf),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load the resolved config file.
pub fn load(config_path: Option<PathBuf>) -> Result<Config, CliError> {
    let path = config_path.ok_or(CliError::ConfigNotFound)?;
    info!(config_path = %path.display(), "Loading configuration");
    Ok(load_config(&path)?)
}

/// Build a transport for the configured server and namespace, and log in with
/// its credentials.
pub async fn connect(config: &Config) -> Result<HttpTransport, CliError> {
    let transport =
        HttpTransport::new(&config.server)?.with_namespace(config.namespace.clone());
    transport
        .login(&config.credentials.username, &config.credentials.password)
        .await?;
    Ok(transport)
}
