//! Per-user running total.

use serde::{Deserialize, Serialize};

/// A user's running expense total, stored in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub amount_in_cents: i64,
}

impl Summary {
    pub fn new(amount_in_cents: i64) -> Self {
        Self { amount_in_cents }
    }

    /// Add an amount in cents. Returns `None` if the total would overflow.
    pub fn add(self, cents: i64) -> Option<Self> {
        self.amount_in_cents.checked_add(cents).map(Self::new)
    }

    /// Amount in major units followed by `$`, e.g. `200.0$` or `210.56$`.
    pub fn pretty_amount(&self) -> String {
        format!("{}$", format_major_units(self.amount_in_cents))
    }
}

/// Format cents as a decimal in major units.
///
/// Uses the shortest representation that round-trips, always with at least
/// one fractional digit and never in exponent form.
fn format_major_units(cents: i64) -> String {
    let value = cents as f64 / 100.0;
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
