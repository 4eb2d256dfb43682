//! Access tokens for the document store.
//!
//! The store only sees `current_token()`. Providers own their refresh logic.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;

/// Scopes requested for the realtime database.
pub const FIREBASE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/firebase.database",
];

/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn current_token(&self) -> Result<String, TokenError>;
}

/// A fixed token. Never refreshed.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn current_token(&self) -> Result<String, TokenError> {
        Ok(self.0.clone())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + TimeDelta::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Default service-account token from the Google Cloud metadata server.
///
/// The token is cached and refreshed lazily once it is within a minute of
/// expiring. The cache lock is held across the refresh, so concurrent callers
/// wait for one request instead of each issuing their own.
pub struct MetadataServerToken {
    http: reqwest::Client,
    base_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataServerToken {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<CachedToken, TokenError> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        let response = self
            .http
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .query(&[("scopes", FIREBASE_SCOPES.join(","))])
            .send()
            .await
            .map_err(|e| TokenError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Status(format!("{status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| TokenError::Parse(e.to_string()))?;

        let expires_at = TimeDelta::try_seconds(token.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                TokenError::Parse(format!("expires_in out of range: {}", token.expires_in))
            })?;

        info!("Refreshed access token (expires in {}s)", token.expires_in);
        Ok(CachedToken {
            value: token.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenProvider for MetadataServerToken {
    async fn current_token(&self) -> Result<String, TokenError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && token.is_fresh(Utc::now())
        {
            return Ok(token.value.clone());
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

#[derive(Debug)]
pub enum TokenError {
    Http(String),
    Status(String),
    Parse(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Http(e) => write!(f, "token request failed: {e}"),
            TokenError::Status(e) => write!(f, "token endpoint error: {e}"),
            TokenError::Parse(e) => write!(f, "invalid token response: {e}"),
        }
    }
}

impl std::error::Error for TokenError {}
