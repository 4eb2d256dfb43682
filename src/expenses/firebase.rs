//! Summary storage in the Firebase Realtime Database REST API.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::credentials::{TokenError, TokenProvider};
use super::summary::Summary;

const ACCESS_TOKEN_PARAM: &str = "access_token";
const SUMMARY_PATH: &str = "summary";

/// Result of a store read or write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Found(Summary),
    NotFound,
    Failed(String),
}

impl StoreOutcome {
    /// Collapse to the record, treating every failure as absent.
    pub fn into_summary(self) -> Option<Summary> {
        match self {
            StoreOutcome::Found(summary) => Some(summary),
            StoreOutcome::NotFound | StoreOutcome::Failed(_) => None,
        }
    }
}

/// Per-user summary records keyed by user id.
///
/// Store failures come back as [`StoreOutcome`]; only credential failures
/// are errors.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn fetch(&self, user_id: i64) -> Result<StoreOutcome, TokenError>;
    async fn store(&self, user_id: i64, summary: &Summary) -> Result<StoreOutcome, TokenError>;
}

pub struct FirebaseClient {
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    http: reqwest::Client,
}

impl FirebaseClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            http: reqwest::Client::new(),
        }
    }

    fn summary_url(&self, user_id: i64) -> String {
        format!("{}/{}/{}.json", self.base_url, SUMMARY_PATH, user_id)
    }
}

#[async_trait]
impl SummaryStore for FirebaseClient {
    async fn fetch(&self, user_id: i64) -> Result<StoreOutcome, TokenError> {
        let token = self.tokens.current_token().await?;
        let result = self
            .http
            .get(self.summary_url(user_id))
            .query(&[(ACCESS_TOKEN_PARAM, token)])
            .send()
            .await;
        Ok(read_outcome("fetch", user_id, result).await)
    }

    async fn store(&self, user_id: i64, summary: &Summary) -> Result<StoreOutcome, TokenError> {
        let token = self.tokens.current_token().await?;
        let result = self
            .http
            .put(self.summary_url(user_id))
            .query(&[(ACCESS_TOKEN_PARAM, token)])
            .json(summary)
            .send()
            .await;
        Ok(read_outcome("store", user_id, result).await)
    }
}

async fn read_outcome(
    op: &str,
    user_id: i64,
    result: reqwest::Result<reqwest::Response>,
) -> StoreOutcome {
    let outcome = match result {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => decode_summary(&body),
            Err(e) => StoreOutcome::Failed(format!("failed to read body: {e}")),
        },
        Ok(response) => {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            StoreOutcome::Failed(format!("{status}: {body}"))
        }
        Err(e) => StoreOutcome::Failed(format!("request failed: {e}")),
    };

    if let StoreOutcome::Failed(ref detail) = outcome {
        warn!("Summary {op} for user {user_id} failed: {detail}");
    }
    outcome
}

/// Decode a response body. The database answers `null` for missing paths.
fn decode_summary(body: &str) -> StoreOutcome {
    match serde_json::from_str::<Option<Summary>>(body) {
        Ok(Some(summary)) => StoreOutcome::Found(summary),
        Ok(None) => StoreOutcome::NotFound,
        Err(e) => StoreOutcome::Failed(format!("invalid summary: {e}")),
    }
}
