//! Caching layer for flex path calculation.
//!
//! Path answers depend only on network data, never on the query, so they
//! can be shared across searches. "No path" answers are cached too; they
//! are the common case when probing many candidate vertices.

use moka::sync::Cache as MokaCache;

use super::path::{FlexPath, FlexPathCalculator};
use crate::domain::{StopPosition, Vertex, VertexId};

/// Cache key: (from vertex, to vertex, boarding position, alighting position).
type PathKey = (VertexId, VertexId, StopPosition, StopPosition);

/// Default maximum number of cached answers.
pub const DEFAULT_PATH_CACHE_CAPACITY: u64 = 10_000;

/// Path calculator wrapper that memoizes answers.
pub struct CachedPathCalculator<C> {
    inner: C,
    paths: MokaCache<PathKey, Option<FlexPath>>,
}

impl<C: FlexPathCalculator> CachedPathCalculator<C> {
    /// Wrap `inner`, keeping at most `max_capacity` answers.
    pub fn new(inner: C, max_capacity: u64) -> Self {
        let paths = MokaCache::builder().max_capacity(max_capacity).build();
        Self { inner, paths }
    }

    /// Access the wrapped calculator.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Get cache statistics (for monitoring).
    ///
    /// Eventually consistent: recent inserts may not be counted yet.
    pub fn entry_count(&self) -> u64 {
        self.paths.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.paths.invalidate_all();
    }
}

impl<C: FlexPathCalculator> FlexPathCalculator for CachedPathCalculator<C> {
    fn calculate_flex_path(
        &self,
        from: &Vertex,
        to: &Vertex,
        from_pos: StopPosition,
        to_pos: StopPosition,
    ) -> Option<FlexPath> {
        let key = (from.id, to.id, from_pos, to_pos);
        self.paths.get_with(key, || {
            self.inner
                .calculate_flex_path(from, to, from_pos, to_pos)
        })
    }
}
