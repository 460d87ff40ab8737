//! Feed-scoped identifier types.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid feed-scoped identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid feed-scoped id: {reason}")]
pub struct InvalidFeedScopedId {
    reason: &'static str,
}

/// An identifier qualified by the feed it was imported from, written `feed:id`.
///
/// Both parts are non-empty and contain no whitespace. The local part may
/// itself contain colons; only the first colon separates the feed.
///
/// # Examples
///
/// ```
/// use flex_router::domain::FeedScopedId;
///
/// let id = FeedScopedId::parse("metro:stop:12").unwrap();
/// assert_eq!(id.feed(), "metro");
/// assert_eq!(id.id(), "stop:12");
/// assert_eq!(id.to_string(), "metro:stop:12");
///
/// assert!(FeedScopedId::parse("no-feed").is_err());
/// assert!(FeedScopedId::parse(":12").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedScopedId {
    raw: Arc<str>,
    split: usize,
}

impl FeedScopedId {
    /// Parse an identifier from its `feed:id` form.
    pub fn parse(s: &str) -> Result<Self, InvalidFeedScopedId> {
        let split = s.find(':').ok_or(InvalidFeedScopedId {
            reason: "missing ':' between feed and id",
        })?;

        if split == 0 {
            return Err(InvalidFeedScopedId {
                reason: "feed must not be empty",
            });
        }
        if split + 1 == s.len() {
            return Err(InvalidFeedScopedId {
                reason: "id must not be empty",
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(InvalidFeedScopedId {
                reason: "must not contain whitespace",
            });
        }

        Ok(Self {
            raw: Arc::from(s),
            split,
        })
    }

    /// Build an identifier from its two parts.
    pub fn new(feed: &str, id: &str) -> Result<Self, InvalidFeedScopedId> {
        Self::parse(&format!("{feed}:{id}"))
    }

    /// Returns the feed part.
    pub fn feed(&self) -> &str {
        &self.raw[..self.split]
    }

    /// Returns the local id part.
    pub fn id(&self) -> &str {
        &self.raw[self.split + 1..]
    }

    /// Returns the full `feed:id` string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Debug for FeedScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedScopedId({})", self.as_str())
    }
}

impl fmt::Display for FeedScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FeedScopedId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FeedScopedId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FeedScopedId::parse(&s).map_err(serde::de::Error::custom)
    }
}
