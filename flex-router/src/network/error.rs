//! Network loading error types.

use crate::domain::{DomainError, FeedScopedId, TimeError};

/// Errors that can occur while loading a network fixture.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Failed to read the fixture file
    #[error("failed to read network: {0}")]
    Io(#[from] std::io::Error),

    /// Fixture is not valid JSON for this schema
    #[error("failed to parse network: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two stops share an id
    #[error("duplicate stop: {0}")]
    DuplicateStop(FeedScopedId),

    /// A row names a booking rule that isn't defined
    #[error("trip {trip}: unknown booking rule {rule}")]
    UnknownBookingRule {
        trip: FeedScopedId,
        rule: FeedScopedId,
    },

    /// A time string failed to parse
    #[error("{context}: {source}")]
    Time {
        context: FeedScopedId,
        #[source]
        source: TimeError,
    },

    /// A row or pattern failed validation
    #[error("{context}: {source}")]
    Domain {
        context: FeedScopedId,
        #[source]
        source: DomainError,
    },
}

impl NetworkError {
    pub(crate) fn time(context: &FeedScopedId, source: TimeError) -> Self {
        Self::Time {
            context: context.clone(),
            source,
        }
    }

    pub(crate) fn domain(context: &FeedScopedId, source: DomainError) -> Self {
        Self::Domain {
            context: context.clone(),
            source,
        }
    }
}
