//! Range search over flex access/egress candidates.
//!
//! The outer search hands us candidate rides: a walk to a flex stop, a
//! trip with boarding and alighting positions, and a walk from the
//! alighting stop. Each range iteration builds one itinerary per candidate
//! at a shifted target time. Results are merged, de-duplicated, ranked and
//! truncated.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::domain::{
    FeedScopedId, FlexServiceDate, Itinerary, Stop, StopPosition, Transfer, Vertex, instant_at,
};
use crate::flex::{
    AccessEgressTemplate, CachedPathCalculator, ContinuousStopsPathCalculator,
    DirectPathCalculator, FlexPathCalculator, FlexTrip, FlexTripKind, NearbyStop,
    TemplateDirection, build_direct, build_transfer,
};

use super::config::{ConfigError, RoutingConfig};
use super::filter::{FilterChain, MaxLimitFilter};
use super::rank::{deduplicate, rank_itineraries};

/// Error creating a router.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build search thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// When the rider wants to travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlexQuery {
    /// Target is the latest arrival rather than the earliest departure
    pub arrive_by: bool,
    /// Seconds since `start_of_time`
    pub target: i32,
    pub start_of_time: NaiveDateTime,
}

impl FlexQuery {
    pub fn depart_at(target: i32, start_of_time: NaiveDateTime) -> Self {
        Self {
            arrive_by: false,
            target,
            start_of_time,
        }
    }

    pub fn arrive_by(target: i32, start_of_time: NaiveDateTime) -> Self {
        Self {
            arrive_by: true,
            target,
            start_of_time,
        }
    }

    /// The target as an instant.
    pub fn target_time(&self) -> NaiveDateTime {
        instant_at(self.start_of_time, self.target)
    }
}

/// One flex ride found by the outer search, owning everything a template
/// borrows.
///
/// Continuous pickup/drop-off trips carry their own path calculator, so
/// the ride lasts exactly as long as the trip's interpolated schedule.
#[derive(Debug, Clone)]
pub struct FlexAccessEgress {
    pub nearby: NearbyStop,
    pub trip: Arc<FlexTrip>,
    pub from_pos: StopPosition,
    pub to_pos: StopPosition,
    pub transfer_stop: Arc<Stop>,
    pub date: FlexServiceDate,
    trip_calculator: Option<Arc<dyn FlexPathCalculator>>,
}

impl FlexAccessEgress {
    pub fn new(
        nearby: NearbyStop,
        trip: Arc<FlexTrip>,
        from_pos: StopPosition,
        to_pos: StopPosition,
        transfer_stop: Arc<Stop>,
        date: FlexServiceDate,
    ) -> Self {
        let trip_calculator = match trip.kind() {
            FlexTripKind::ContinuousPickupDropOff => Some(Arc::new(
                ContinuousStopsPathCalculator::new(Arc::clone(&trip)),
            ) as Arc<dyn FlexPathCalculator>),
            FlexTripKind::Unscheduled | FlexTripKind::ScheduledDeviated => None,
        };
        Self {
            nearby,
            trip,
            from_pos,
            to_pos,
            transfer_stop,
            date,
            trip_calculator,
        }
    }

    /// Same ride, ending its leg at a different stop.
    pub fn with_transfer_stop(self, transfer_stop: Arc<Stop>) -> Self {
        Self {
            transfer_stop,
            ..self
        }
    }

    /// Borrow this ride as a template.
    ///
    /// `calculator` times the ride unless the trip brings its own.
    pub fn template<'a>(
        &'a self,
        calculator: &'a dyn FlexPathCalculator,
        direction: TemplateDirection,
    ) -> AccessEgressTemplate<'a> {
        let calculator: &'a dyn FlexPathCalculator = match &self.trip_calculator {
            Some(own) => own.as_ref(),
            None => calculator,
        };
        AccessEgressTemplate {
            nearby: &self.nearby,
            trip: &self.trip,
            from_pos: self.from_pos,
            to_pos: self.to_pos,
            transfer_stop: &self.transfer_stop,
            date: self.date,
            calculator,
            direction,
        }
    }
}

/// Walk, flex ride, walk.
#[derive(Debug, Clone)]
pub struct DirectCandidate {
    pub access: FlexAccessEgress,
    pub egress: NearbyStop,
}

/// Two flex rides joined by a transfer at one stop.
#[derive(Debug, Clone)]
pub struct TransferCandidate {
    pub access: FlexAccessEgress,
    pub transfer: Transfer,
    pub egress: FlexAccessEgress,
}

/// Result of a flex range search.
#[derive(Debug, Clone)]
pub struct FlexSearchResult {
    /// Found itineraries, ranked best-first.
    pub itineraries: Vec<Itinerary>,

    /// Number of range iterations run.
    pub iterations: usize,

    /// Itineraries built before de-duplication and truncation.
    pub itineraries_built: usize,
}

impl FlexSearchResult {
    /// Create an empty result.
    pub fn empty() -> Self {
        Self {
            itineraries: Vec::new(),
            iterations: 0,
            itineraries_built: 0,
        }
    }
}

/// Flex itinerary router.
///
/// Holds the network-wide path calculator and, when configured, a worker
/// pool for range iterations. Safe to share between queries.
pub struct FlexRouter {
    config: RoutingConfig,
    calculator: Arc<dyn FlexPathCalculator>,
    stop_vertices: HashMap<FeedScopedId, Vertex>,
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for FlexRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlexRouter")
            .field("config", &self.config)
            .field("calculator", &self.calculator)
            .field("stop_vertices", &self.stop_vertices.len())
            .field("pool", &self.pool.as_ref().map(|p| p.current_num_threads()))
            .finish()
    }
}

impl FlexRouter {
    /// Create a router using `calculator` for flex ride durations.
    pub fn new(
        config: RoutingConfig,
        calculator: Arc<dyn FlexPathCalculator>,
    ) -> Result<Self, RouterError> {
        config.validate()?;
        let pool = match config.search_thread_pool_size {
            0 => None,
            n => Some(rayon::ThreadPoolBuilder::new().num_threads(n).build()?),
        };
        Ok(Self {
            config,
            calculator,
            stop_vertices: HashMap::new(),
            pool,
        })
    }

    /// Create a router estimating rides as straight lines, with answers
    /// cached.
    pub fn with_direct_paths(config: RoutingConfig) -> Result<Self, RouterError> {
        let direct =
            DirectPathCalculator::new(config.flex_speed_mps, config.direct_extra_time_secs);
        let cached = CachedPathCalculator::new(direct, config.path_cache_capacity);
        Self::new(config, Arc::new(cached))
    }

    /// Set the street vertex of each stop, used to place transfers.
    pub fn with_stop_vertices(mut self, stop_vertices: HashMap<FeedScopedId, Vertex>) -> Self {
        self.stop_vertices = stop_vertices;
        self
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Target times of each range iteration, in search order.
    ///
    /// Depart-at searches step later from the target; arrive-by searches
    /// step earlier.
    pub fn iteration_targets(&self, query: &FlexQuery) -> Vec<i32> {
        let step = self.config.iteration_departure_step_secs;
        (0..self.config.iteration_count())
            .map_while(|k| {
                let delta = i32::try_from(k as i64 * step).ok()?;
                if query.arrive_by {
                    query.target.checked_sub(delta)
                } else {
                    query.target.checked_add(delta)
                }
            })
            .collect()
    }

    /// Filters applied to a merged result list.
    fn truncation_filter(&self, query: &FlexQuery) -> FilterChain {
        let mut filter = MaxLimitFilter::new("flex-max-limit", self.config.max_itineraries)
            .with_changed_subscriber(|dropped| {
                trace!(
                    start = %dropped.start_time(),
                    end = %dropped.end_time(),
                    "first itinerary beyond limit"
                );
            });
        if !query.arrive_by {
            filter = filter
                .with_latest_departure_time_limit(query.target_time() + self.config.search_window());
        }
        FilterChain::new().with(filter)
    }

    /// Run `per_target` for every iteration, on the pool if there is one.
    fn run_iterations<F>(&self, targets: &[i32], per_target: F) -> Vec<Itinerary>
    where
        F: Fn(i32) -> Vec<Itinerary> + Send + Sync,
    {
        match &self.pool {
            Some(pool) => pool.install(|| {
                targets
                    .par_iter()
                    .flat_map_iter(|&target| per_target(target))
                    .collect()
            }),
            None => targets.iter().flat_map(|&target| per_target(target)).collect(),
        }
    }

    /// Merge, rank and truncate.
    fn finish(&self, built: Vec<Itinerary>, iterations: usize, query: &FlexQuery) -> FlexSearchResult {
        let itineraries_built = built.len();
        let unique = deduplicate(built);
        let ranked = rank_itineraries(unique, query.arrive_by);
        let itineraries = self.truncation_filter(query).filter(ranked);

        debug!(
            iterations,
            built = itineraries_built,
            returned = itineraries.len(),
            arrive_by = query.arrive_by,
            "flex search complete"
        );

        FlexSearchResult {
            itineraries,
            iterations,
            itineraries_built,
        }
    }

    /// Door-to-door itineraries over a single flex ride.
    pub fn direct_itineraries(
        &self,
        candidates: &[DirectCandidate],
        query: &FlexQuery,
    ) -> FlexSearchResult {
        if candidates.is_empty() {
            return FlexSearchResult::empty();
        }

        let targets = self.iteration_targets(query);
        let calculator: &dyn FlexPathCalculator = self.calculator.as_ref();

        let built = self.run_iterations(&targets, |target| {
            let found: Vec<Itinerary> = candidates
                .iter()
                .filter_map(|candidate| {
                    let template = candidate
                        .access
                        .template(calculator, TemplateDirection::Access);
                    build_direct(
                        &template,
                        &candidate.egress,
                        query.arrive_by,
                        target,
                        query.start_of_time,
                    )
                })
                .collect();
            trace!(target, found = found.len(), "range iteration");
            found
        });

        self.finish(built, targets.len(), query)
    }

    /// Itineraries joining two flex rides through a same-stop transfer.
    ///
    /// Candidates whose transfer is unsupported, or whose rides cannot
    /// reach the transfer stop, are skipped.
    pub fn transfer_itineraries(
        &self,
        candidates: &[TransferCandidate],
        query: &FlexQuery,
    ) -> Vec<Itinerary> {
        let calculator: &dyn FlexPathCalculator = self.calculator.as_ref();

        let itineraries: Vec<Itinerary> = candidates
            .iter()
            .filter_map(|candidate| {
                let access = candidate
                    .access
                    .template(calculator, TemplateDirection::Access);
                let egress = candidate
                    .egress
                    .template(calculator, TemplateDirection::Egress);
                build_transfer(
                    &access,
                    &candidate.transfer,
                    &egress,
                    query.arrive_by,
                    query.target,
                    query.start_of_time,
                    &self.stop_vertices,
                )
            })
            .collect();

        debug!(
            candidates = candidates.len(),
            found = itineraries.len(),
            "flex transfer itineraries"
        );
        itineraries
    }
}
