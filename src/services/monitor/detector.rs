use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::services::notifier::{format_amount, AlertMessage};
use crate::services::state::TIMESTAMP_FORMAT;

/// Result of comparing a fresh balance against the last known one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub previous: Option<Decimal>,
    pub current: Decimal,
    pub delta: Decimal,
    pub changed: bool,
}

/// Compare balances exactly. The first observation only seeds state and is
/// never reported as a change.
pub fn detect(previous: Option<Decimal>, current: Decimal) -> BalanceChange {
    match previous {
        Some(prev) if prev != current => BalanceChange {
            previous,
            current,
            delta: current - prev,
            changed: true,
        },
        _ => BalanceChange {
            previous,
            current,
            delta: Decimal::ZERO,
            changed: false,
        },
    }
}

impl BalanceChange {
    /// Alert text for a detected change, `None` when nothing changed
    pub fn alert_message(&self, symbol: &str, at: NaiveDateTime) -> Option<AlertMessage> {
        let previous = self.previous.filter(|_| self.changed)?;

        Some(AlertMessage::new(
            format!("{} Balance Change Alert", symbol),
            format!(
                "Previous: {} {sym}\nCurrent: {} {sym}\nChange: {} {sym}\nTime: {}",
                format_amount(previous),
                format_amount(self.current),
                format_amount(self.delta),
                at.format(TIMESTAMP_FORMAT),
                sym = symbol
            ),
        ))
    }
}
