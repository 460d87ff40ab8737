//! Domain error types.
//!
//! These errors represent invalid input rows and internal consistency
//! failures. Ordinary infeasibility (no time window fits, no path) is not an
//! error anywhere in this crate; it is an absent result.

use super::{FeedScopedId, StopIndex, VertexId};

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// No stop position in a pattern matches a time the caller derived from it
    #[error(
        "no stop position in pattern found: stop index {stop_index}, time {time}, departure {departure}"
    )]
    NoStopPosition {
        stop_index: StopIndex,
        time: i32,
        departure: bool,
    },

    /// Stop position is beyond the end of the pattern
    #[error("stop position {position} out of range for pattern of {len} stops")]
    StopPositionOutOfRange { position: usize, len: usize },

    /// A stop-time row failed validation
    #[error("invalid stop time: {0}")]
    InvalidStopTime(&'static str),

    /// Stop referenced by a row is not in the network
    #[error("unknown stop: {0}")]
    UnknownStop(FeedScopedId),

    /// Consecutive legs don't share a vertex
    #[error("legs are not connected: {0} does not meet {1}")]
    LegsNotConnected(VertexId, VertexId),

    /// Itinerary has no legs
    #[error("itinerary must have at least one leg")]
    EmptyItinerary,
}
