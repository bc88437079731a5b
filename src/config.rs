use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use url::Url;

use crate::auth::Credentials;
use crate::constants::DEFAULT_API_HOST;

/// Command-line flags. Each flag also accepts a kebab-case spelling and an
/// environment variable.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "qweather-mcp-server",
    version,
    about = "MCP server for QWeather forecasts, city search, warnings and life indices"
)]
pub struct Cli {
    /// QWeather API host
    #[arg(
        long = "apiHost",
        alias = "api-host",
        env = "QWEATHER_API_HOST",
        default_value = DEFAULT_API_HOST
    )]
    pub api_host: String,

    /// Ed25519 private key in PKCS#8 PEM form
    #[arg(
        long = "privateKey",
        alias = "private-key",
        env = "QWEATHER_PRIVATE_KEY",
        hide_env_values = true,
        default_value = ""
    )]
    pub private_key: String,

    /// File holding the Ed25519 private key
    #[arg(
        long = "privateKeyFile",
        alias = "private-key-file",
        env = "QWEATHER_PRIVATE_KEY_FILE",
        conflicts_with = "private_key"
    )]
    pub private_key_file: Option<PathBuf>,

    /// Credential id of the key, sent as the JWT `kid`
    #[arg(long = "keyId", alias = "key-id", env = "QWEATHER_KEY_ID", default_value = "")]
    pub key_id: String,

    /// Project id, sent as the JWT `sub`
    #[arg(
        long = "projectId",
        alias = "project-id",
        env = "QWEATHER_PROJECT_ID",
        default_value = ""
    )]
    pub project_id: String,
}

/// Process-wide settings, fixed after startup
#[derive(Debug, Clone)]
pub struct Config {
    pub api_host: Url,
    pub credentials: Credentials,
}

impl Config {
    pub fn new(api_host: &str, credentials: Credentials) -> Result<Self> {
        let api_host = Url::parse(api_host)
            .with_context(|| format!("Invalid API host '{}'", api_host))?;
        if api_host.cannot_be_a_base() {
            anyhow::bail!("API host '{}' cannot be used as a base URL", api_host);
        }

        Ok(Self {
            api_host,
            credentials,
        })
    }

    /// Builds the configuration from parsed flags, reading the key file if one was given.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let private_key = match &cli.private_key_file {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read private key from {}", path.display()))?,
            None => cli.private_key,
        };

        if private_key.trim().is_empty() {
            tracing::warn!("No private key configured; every tool call will fail to authenticate");
        }

        Self::new(
            &cli.api_host,
            Credentials::new(private_key, cli.key_id, cli.project_id),
        )
    }

    /// Joins an endpoint path onto the host, keeping any path prefix the host carries.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.api_host.clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url.set_query(None);
        url
    }
}
