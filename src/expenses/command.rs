//! Command grammar: `/getSummary` and `/addExpense <amount>`.

use std::sync::LazyLock;

use regex::Regex;

const COMMAND_PREFIX: char = '/';
const GET_SUMMARY: &str = "getSummary";
const ADD_EXPENSE: &str = "addExpense";

/// Byte offset of the amount in `/addExpense <amount>`.
const AMOUNT_OFFSET: usize = 12;

/// Decimal amount in major units, `.` separator, fractional part optional.
static AMOUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("amount pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetSummary,
    /// `None` when the amount is missing or malformed.
    AddExpense(Option<i64>),
}

impl Command {
    /// Recognize a command in message text.
    ///
    /// The text must start with `/` followed by the command keyword.
    /// Anything else is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.strip_prefix(COMMAND_PREFIX)?;
        if rest.starts_with(GET_SUMMARY) {
            Some(Self::GetSummary)
        } else if rest.starts_with(ADD_EXPENSE) {
            let amount = text.get(AMOUNT_OFFSET..).and_then(parse_amount_cents);
            Some(Self::AddExpense(amount))
        } else {
            None
        }
    }
}

/// Parse a major-unit decimal amount into cents, rounding to the nearest cent.
pub fn parse_amount_cents(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if !AMOUNT_PATTERN.is_match(raw) {
        return None;
    }
    let major: f64 = raw.parse().ok()?;
    let cents = (major * 100.0).round();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if !cents.is_finite() || cents >= i64::MAX as f64 || cents < i64::MIN as f64 {
        return None;
    }
    Some(cents as i64)
}
