//! Expense tracking - Telegram commands backed by a remote running total.

pub mod command;
pub mod credentials;
pub mod firebase;
pub mod handler;
pub mod processor;
pub mod summary;
pub mod telegram;
pub mod update;


pub use command::Command;
pub use credentials::{MetadataServerToken, StaticToken, TokenError, TokenProvider};
pub use firebase::{FirebaseClient, StoreOutcome, SummaryStore};
pub use handler::{HandlerError, HandlerOutcome, RequestHandler};
pub use processor::CommandProcessor;
pub use summary::Summary;
pub use telegram::{parse_update, Messenger, TelegramClient};
pub use update::{Message, Update, User};
