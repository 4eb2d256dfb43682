//! Turns an update into a reply.

use tracing::{info, warn};

use super::command::Command;
use super::credentials::TokenError;
use super::firebase::{StoreOutcome, SummaryStore};
use super::summary::Summary;
use super::update::Update;

pub const INVALID_AMOUNT: &str = "This expense amount seems incorrect";
pub const ADD_EXPENSE_FAILED: &str = "There was an error trying to add expense";

pub struct CommandProcessor<S> {
    store: S,
}

impl<S: SummaryStore> CommandProcessor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Process an update. `None` means nothing should be sent back.
    pub async fn process(&self, update: &Update) -> Result<Option<String>, TokenError> {
        let Some(command) = update.text().and_then(Command::parse) else {
            return Ok(None);
        };
        let Some(user_id) = update.sender_id() else {
            warn!("Command {:?} in update {} has no sender, ignoring", command, update.update_id);
            return Ok(None);
        };

        info!("Command {:?} from user {}", command, user_id);
        let reply = match command {
            Command::GetSummary => self.get_summary(user_id).await?,
            Command::AddExpense(None) => INVALID_AMOUNT.to_string(),
            Command::AddExpense(Some(cents)) => self.add_expense(user_id, cents).await?,
        };
        Ok(Some(reply))
    }

    async fn get_summary(&self, user_id: i64) -> Result<String, TokenError> {
        // Same text as a failed add.
        let reply = match self.store.fetch(user_id).await?.into_summary() {
            Some(summary) => format!("Your total expense is: {}", summary.pretty_amount()),
            None => ADD_EXPENSE_FAILED.to_string(),
        };
        Ok(reply)
    }

    async fn add_expense(&self, user_id: i64, cents: i64) -> Result<String, TokenError> {
        let current = match self.store.fetch(user_id).await? {
            StoreOutcome::Found(summary) => summary,
            StoreOutcome::NotFound => Summary::default(),
            // Writing here would replace the real total with `cents`.
            StoreOutcome::Failed(_) => return Ok(ADD_EXPENSE_FAILED.to_string()),
        };

        let Some(updated) = current.add(cents) else {
            warn!("Total for user {} would overflow adding {} cents", user_id, cents);
            return Ok(ADD_EXPENSE_FAILED.to_string());
        };

        let reply = match self.store.store(user_id, &updated).await?.into_summary() {
            Some(saved) => format!(
                "Expense added successfully, your new total is {}",
                saved.pretty_amount()
            ),
            None => ADD_EXPENSE_FAILED.to_string(),
        };
        Ok(reply)
    }
}
