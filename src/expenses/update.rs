//! Inbound Telegram update payloads.
//!
//! Only the fields the bot reads are modeled. Everything is optional except
//! the sender id, so partial payloads still deserialize; unknown fields are
//! ignored.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: i64,
    pub text: Option<String>,
    pub from: Option<User>,
    #[serde(default)]
    pub date: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
}

impl Update {
    pub fn text(&self) -> Option<&str> {
        self.message.as_ref()?.text.as_deref()
    }

    pub fn sender_id(&self) -> Option<i64> {
        self.message.as_ref()?.from.as_ref().map(|u| u.id)
    }
}
