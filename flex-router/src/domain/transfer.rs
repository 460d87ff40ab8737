//! Transfers between trips.

use serde::{Deserialize, Serialize};

use super::FeedScopedId;

/// How a transfer between two trips is timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferType {
    /// Recommended transfer point, no timing guarantee.
    #[default]
    Recommended,
    /// The departing vehicle waits for the arriving one.
    Guaranteed,
    /// Requires at least `min_transfer_time_seconds` between the two.
    MinTime,
    /// Transfers are not possible here.
    NotPossible,
}

/// A transfer from one stop to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub from_stop: FeedScopedId,
    pub to_stop: FeedScopedId,
    pub transfer_type: TransferType,
    #[serde(default)]
    pub min_transfer_time_seconds: i32,
}

impl Transfer {
    /// Creates a transfer.
    pub fn new(
        from_stop: FeedScopedId,
        to_stop: FeedScopedId,
        transfer_type: TransferType,
        min_transfer_time_seconds: i32,
    ) -> Self {
        Self {
            from_stop,
            to_stop,
            transfer_type,
            min_transfer_time_seconds,
        }
    }

    /// Returns true if the transfer stays at one stop.
    pub fn is_same_stop(&self) -> bool {
        self.from_stop == self.to_stop
    }
}
