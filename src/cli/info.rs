use crate::cli::{connect, load, CliError};
use crate::client::transport::Transport;
use std::path::PathBuf;

const SERVER_INFO_RESOURCE: &str = "server/info";

/// Print the server's `server/info` document.
pub async fn run(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config = load(config_path)?;
    let transport = connect(&config).await?;

    let document = transport
        .get_document(&config.namespace, SERVER_INFO_RESOURCE, &[])
        .await?;

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
