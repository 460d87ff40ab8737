//! Classification of stop-time sequences into flex trips.
//!
//! Rules are checked in a fixed order and the first match wins:
//!
//! 1. Unscheduled: every row has a window and no row has a fixed time.
//! 2. Scheduled-deviated: some row has a fixed time and some other row has
//!    a window.
//! 3. Continuous: some row offers continuous pickup or drop-off and every
//!    row carries a time to interpolate between.
//!
//! Rows with neither a fixed time nor a window may sit between the
//! timepoints of a scheduled-deviated trip. Sequences matching none of
//! these rules are not flex trips. They are left to the fixed-schedule side
//! of the network.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::trip::{
    ContinuousPickupDropOffTrip, FlexTrip, FlexTripKind, ScheduledDeviatedTrip, UnscheduledTrip,
};
use crate::domain::{FeedScopedId, StopTimeWindow};

/// Decide which flex variant a stop-time sequence represents.
///
/// Returns `None` for empty sequences.
pub fn detect_kind(stop_times: &[StopTimeWindow]) -> Option<FlexTripKind> {
    if stop_times.is_empty() {
        return None;
    }

    if is_unscheduled(stop_times) {
        Some(FlexTripKind::Unscheduled)
    } else if is_scheduled_deviated(stop_times) {
        Some(FlexTripKind::ScheduledDeviated)
    } else if has_continuous_stops(stop_times) {
        Some(FlexTripKind::ContinuousPickupDropOff)
    } else {
        None
    }
}

fn is_unscheduled(stop_times: &[StopTimeWindow]) -> bool {
    stop_times
        .iter()
        .all(|row| row.is_flexible() && !row.is_timepoint())
}

fn is_scheduled_deviated(stop_times: &[StopTimeWindow]) -> bool {
    stop_times.iter().enumerate().any(|(i, timed)| {
        timed.is_timepoint()
            && stop_times
                .iter()
                .enumerate()
                .any(|(j, flexible)| j != i && flexible.is_flexible())
    })
}

fn has_continuous_stops(stop_times: &[StopTimeWindow]) -> bool {
    stop_times.iter().any(StopTimeWindow::is_continuous)
        && !stop_times.iter().any(StopTimeWindow::is_untimed)
}

/// Classify one trip's stop-time sequence.
///
/// Deterministic: the same rows always give the same variant.
pub fn classify(id: FeedScopedId, stop_times: Vec<StopTimeWindow>) -> Option<FlexTrip> {
    match detect_kind(&stop_times)? {
        FlexTripKind::Unscheduled => {
            Some(FlexTrip::Unscheduled(UnscheduledTrip::new(id, stop_times)))
        }
        FlexTripKind::ScheduledDeviated => Some(FlexTrip::ScheduledDeviated(
            ScheduledDeviatedTrip::new(id, stop_times),
        )),
        FlexTripKind::ContinuousPickupDropOff => {
            ContinuousPickupDropOffTrip::new(id, stop_times).map(FlexTrip::ContinuousPickupDropOff)
        }
    }
}

/// Counts reported after building a [`FlexIndex`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationSummary {
    /// Trips inspected
    pub inspected: usize,
    pub unscheduled: usize,
    pub scheduled_deviated: usize,
    pub continuous: usize,
}

impl ClassificationSummary {
    /// Total number of trips classified as flex.
    pub fn classified(&self) -> usize {
        self.unscheduled + self.scheduled_deviated + self.continuous
    }

    /// Number of trips that were not flex trips.
    pub fn skipped(&self) -> usize {
        self.inspected - self.classified()
    }

    fn record(&mut self, kind: FlexTripKind) {
        match kind {
            FlexTripKind::Unscheduled => self.unscheduled += 1,
            FlexTripKind::ScheduledDeviated => self.scheduled_deviated += 1,
            FlexTripKind::ContinuousPickupDropOff => self.continuous += 1,
        }
    }
}

/// Immutable index of classified flex trips, keyed by trip id.
///
/// Built once while preparing the network, then shared read-only by every
/// search.
#[derive(Debug, Clone, Default)]
pub struct FlexIndex {
    trips: HashMap<FeedScopedId, Arc<FlexTrip>>,
    summary: ClassificationSummary,
}

impl FlexIndex {
    /// Classify every trip and index the flex ones.
    ///
    /// If a trip id appears more than once, the last sequence wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use flex_router::domain::{Coordinate, FeedScopedId, Stop, StopTimeWindow};
    /// use flex_router::flex::{FlexIndex, FlexTripKind};
    /// use std::sync::Arc;
    ///
    /// let id = |s: &str| FeedScopedId::parse(s).unwrap();
    /// let stop = Arc::new(Stop::point(id("f:a"), "A", Coordinate::new(59.9, 10.7)));
    ///
    /// let flex = vec![
    ///     StopTimeWindow::flexible(stop.clone(), 100, 500).unwrap(),
    ///     StopTimeWindow::flexible(stop.clone(), 300, 900).unwrap(),
    /// ];
    /// let fixed = vec![
    ///     StopTimeWindow::timepoint(stop.clone(), 100, 100).unwrap(),
    ///     StopTimeWindow::timepoint(stop, 200, 200).unwrap(),
    /// ];
    ///
    /// let index = FlexIndex::build(vec![(id("f:t1"), flex), (id("f:t2"), fixed)]);
    /// assert_eq!(index.len(), 1);
    /// assert_eq!(index.get(&id("f:t1")).unwrap().kind(), FlexTripKind::Unscheduled);
    /// assert!(index.get(&id("f:t2")).is_none());
    /// ```
    pub fn build<I>(trips: I) -> Self
    where
        I: IntoIterator<Item = (FeedScopedId, Vec<StopTimeWindow>)>,
    {
        let mut index = HashMap::new();
        let mut summary = ClassificationSummary::default();

        for (id, stop_times) in trips {
            summary.inspected += 1;
            match classify(id.clone(), stop_times) {
                Some(trip) => {
                    index.insert(id, Arc::new(trip));
                }
                None => debug!(trip = %id, "not a flex trip"),
            }
        }

        // Recount from the index so duplicate ids are not double counted
        for trip in index.values() {
            summary.record(trip.kind());
        }

        info!(
            inspected = summary.inspected,
            unscheduled = summary.unscheduled,
            scheduled_deviated = summary.scheduled_deviated,
            continuous = summary.continuous,
            "done creating flex trips, created a total of {} trips",
            summary.classified()
        );

        Self {
            trips: index,
            summary,
        }
    }

    /// Look up a trip by id.
    pub fn get(&self, id: &FeedScopedId) -> Option<&Arc<FlexTrip>> {
        self.trips.get(id)
    }

    /// Number of flex trips.
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    /// Returns true if no trip was classified as flex.
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// Iterate over all flex trips in no particular order.
    pub fn trips(&self) -> impl Iterator<Item = &Arc<FlexTrip>> {
        self.trips.values()
    }

    /// Iterate over the trips of one variant.
    pub fn trips_of_kind(&self, kind: FlexTripKind) -> impl Iterator<Item = &Arc<FlexTrip>> {
        self.trips.values().filter(move |t| t.kind() == kind)
    }

    /// Returns the counts gathered while building.
    pub fn summary(&self) -> ClassificationSummary {
        self.summary
    }
}
