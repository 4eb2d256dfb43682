//! Webhook request handling: body in, reply out.

use tracing::info;

use super::credentials::TokenError;
use super::firebase::SummaryStore;
use super::processor::CommandProcessor;
use super::telegram::{parse_update, Messenger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// A reply was sent to the sender.
    Replied,
    /// Nothing to answer.
    Ignored,
}

pub struct RequestHandler<S, M> {
    processor: CommandProcessor<S>,
    messenger: M,
}

impl<S: SummaryStore, M: Messenger> RequestHandler<S, M> {
    pub fn new(store: S, messenger: M) -> Self {
        Self {
            processor: CommandProcessor::new(store),
            messenger,
        }
    }

    #[cfg(test)]
    pub(crate) fn processor(&self) -> &CommandProcessor<S> {
        &self.processor
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    pub async fn handle(&self, body: &str) -> Result<HandlerOutcome, HandlerError> {
        let update = parse_update(body).map_err(HandlerError::Parse)?;
        info!("Update {} from {:?}", update.update_id, update.sender_id());

        let reply = self
            .processor
            .process(&update)
            .await
            .map_err(HandlerError::Credentials)?;

        // `process` only replies when there is a sender.
        match (reply, update.sender_id()) {
            (Some(text), Some(user_id)) if !text.is_empty() => {
                self.messenger
                    .send_message(user_id, &text)
                    .await
                    .map_err(HandlerError::Send)?;
                info!("Reply sent to {}", user_id);
                Ok(HandlerOutcome::Replied)
            }
            _ => Ok(HandlerOutcome::Ignored),
        }
    }
}

#[derive(Debug)]
pub enum HandlerError {
    /// The request body is not a valid update.
    Parse(serde_json::Error),
    /// No access token for the document store.
    Credentials(TokenError),
    /// The reply could not be delivered.
    Send(String),
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "invalid update payload: {e}"),
            Self::Credentials(e) => write!(f, "credentials unavailable: {e}"),
            Self::Send(e) => write!(f, "reply not sent: {e}"),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Credentials(e) => Some(e),
            Self::Send(_) => None,
        }
    }
}
