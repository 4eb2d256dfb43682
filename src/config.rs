use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use reqwest::Url;

pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Required environment variable not set.
    Missing(&'static str),
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Missing(var) => write!(f, "environment variable {} is not set", var),
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Missing(_) | Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    bot_token: String,
    /// Realtime database root, e.g. "https://my-app.firebaseio.com"
    firebase_url: String,
    /// Fixed database token. Without it tokens come from the metadata server.
    access_token: Option<String>,
    metadata_url: Option<String>,
    listen_addr: Option<String>,
    /// Public URL Telegram should deliver updates to. Registered on start-up.
    webhook_url: Option<String>,
    /// Directory for log files. Logs go to stdout only when unset.
    log_dir: Option<String>,
}

#[derive(Debug)]
pub struct Config {
    pub bot_token: String,
    pub firebase_url: String,
    pub access_token: Option<String>,
    pub metadata_url: String,
    pub listen_addr: SocketAddr,
    pub webhook_url: Option<Url>,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;
        Self::build(file)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from named variables. `PORT` overrides the port of the listen
    /// address, as set by serverless runtimes.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| var(name).filter(|v| !v.is_empty());

        let mut listen_addr = var("LISTEN_ADDR");
        if let Some(port) = var("PORT") {
            let host = listen_addr
                .as_deref()
                .and_then(|a| a.rsplit_once(':'))
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            listen_addr = Some(format!("{host}:{port}"));
        }

        let file = ConfigFile {
            bot_token: var("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?,
            firebase_url: var("FIREBASE_URL").ok_or(ConfigError::Missing("FIREBASE_URL"))?,
            access_token: var("FIREBASE_ACCESS_TOKEN"),
            metadata_url: var("GCE_METADATA_HOST").map(|host| {
                if host.contains("://") { host } else { format!("http://{host}") }
            }),
            listen_addr,
            webhook_url: var("WEBHOOK_URL"),
            log_dir: var("LOG_DIR"),
        };
        Self::build(file)
    }

    fn build(file: ConfigFile) -> Result<Self, ConfigError> {
        if file.bot_token.is_empty() {
            return Err(ConfigError::Validation("bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into(),
            ));
        }

        let firebase_url = file.firebase_url.trim_end_matches('/').to_string();
        match Url::parse(&firebase_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "firebase_url must be an http(s) URL, got '{}'",
                    file.firebase_url
                )));
            }
        }

        let listen_addr = file
            .listen_addr
            .as_deref()
            .unwrap_or(DEFAULT_LISTEN_ADDR)
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Validation(format!("invalid listen_addr: {e}")))?;

        let webhook_url = file
            .webhook_url
            .map(|u| {
                Url::parse(&u).map_err(|e| ConfigError::Validation(format!("invalid webhook_url '{u}': {e}")))
            })
            .transpose()?;

        Ok(Self {
            bot_token: file.bot_token,
            firebase_url,
            access_token: file.access_token.filter(|t| !t.is_empty()),
            metadata_url: file
                .metadata_url
                .unwrap_or_else(|| DEFAULT_METADATA_URL.to_string()),
            listen_addr,
            webhook_url,
            log_dir: file.log_dir.map(PathBuf::from),
        })
    }
}
