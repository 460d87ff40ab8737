//! Flex trip variants and their feasibility queries.
//!
//! A flex trip is one of three kinds, fixed at classification time:
//!
//! - [`UnscheduledTrip`]: every stop has a pickup/drop-off window.
//! - [`ScheduledDeviatedTrip`]: fixed timepoints at some stops, windows at
//!   others; deviation is bounded by the surrounding timepoints.
//! - [`ContinuousPickupDropOffTrip`]: boarding and alighting may happen
//!   anywhere along a segment, at fractional positions.
//!
//! All times are seconds since the service day's midnight. Infeasible
//! queries return `None`.

use std::sync::Arc;

use crate::domain::{FeedScopedId, Stop, StopPosition, StopTimeWindow};

/// Which variant a flex trip is, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlexTripKind {
    Unscheduled,
    ScheduledDeviated,
    ContinuousPickupDropOff,
}

impl FlexTripKind {
    /// Returns a short lower-case name for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            FlexTripKind::Unscheduled => "unscheduled",
            FlexTripKind::ScheduledDeviated => "scheduled-deviated",
            FlexTripKind::ContinuousPickupDropOff => "continuous",
        }
    }
}

/// A classified flex trip.
#[derive(Debug, Clone, PartialEq)]
pub enum FlexTrip {
    Unscheduled(UnscheduledTrip),
    ScheduledDeviated(ScheduledDeviatedTrip),
    ContinuousPickupDropOff(ContinuousPickupDropOffTrip),
}

impl FlexTrip {
    /// Returns the trip identifier.
    pub fn id(&self) -> &FeedScopedId {
        match self {
            FlexTrip::Unscheduled(t) => &t.id,
            FlexTrip::ScheduledDeviated(t) => &t.id,
            FlexTrip::ContinuousPickupDropOff(t) => &t.id,
        }
    }

    /// Returns the stop-time rows in trip order.
    pub fn stop_times(&self) -> &[StopTimeWindow] {
        match self {
            FlexTrip::Unscheduled(t) => &t.stop_times,
            FlexTrip::ScheduledDeviated(t) => &t.stop_times,
            FlexTrip::ContinuousPickupDropOff(t) => &t.stop_times,
        }
    }

    /// Returns which variant this is.
    pub fn kind(&self) -> FlexTripKind {
        match self {
            FlexTrip::Unscheduled(_) => FlexTripKind::Unscheduled,
            FlexTrip::ScheduledDeviated(_) => FlexTripKind::ScheduledDeviated,
            FlexTrip::ContinuousPickupDropOff(_) => FlexTripKind::ContinuousPickupDropOff,
        }
    }

    /// Returns the stop at a whole position, or the stop at the start of the
    /// segment for a fractional one.
    pub fn stop_at(&self, position: StopPosition) -> Option<&Arc<Stop>> {
        self.stop_times()
            .get(position.floor_index())
            .map(|row| &row.stop)
    }

    /// Returns every whole position at which `stop` is called.
    pub fn positions_of(&self, stop: &FeedScopedId) -> Vec<StopPosition> {
        self.stop_times()
            .iter()
            .enumerate()
            .filter(|(_, row)| &row.stop.id == stop)
            .map(|(i, _)| StopPosition::from(i))
            .collect()
    }

    /// Earliest time at or after `lower_bound` at which a rider can depart
    /// `from` and reach `to` after `ride_seconds` in the vehicle.
    ///
    /// # Examples
    ///
    /// ```
    /// use flex_router::domain::{Coordinate, FeedScopedId, Stop, StopPosition, StopTimeWindow};
    /// use flex_router::flex::classify;
    /// use std::sync::Arc;
    ///
    /// let stop = |s: &str| Arc::new(Stop::point(
    ///     FeedScopedId::parse(s).unwrap(), s, Coordinate::new(59.9, 10.7),
    /// ));
    /// let rows = vec![
    ///     StopTimeWindow::flexible(stop("f:a"), 100, 500).unwrap(),
    ///     StopTimeWindow::flexible(stop("f:b"), 300, 900).unwrap(),
    /// ];
    /// let trip = classify(FeedScopedId::parse("f:t1").unwrap(), rows).unwrap();
    ///
    /// let (a, b) = (StopPosition::from(0usize), StopPosition::from(1usize));
    /// assert_eq!(trip.earliest_departure_time(50, a, b, 100), Some(100));
    /// assert_eq!(trip.earliest_departure_time(600, a, b, 100), None);
    /// ```
    pub fn earliest_departure_time(
        &self,
        lower_bound: i32,
        from: StopPosition,
        to: StopPosition,
        ride_seconds: i32,
    ) -> Option<i32> {
        match self {
            FlexTrip::Unscheduled(t) => t.earliest_departure_time(lower_bound, from, to, ride_seconds),
            FlexTrip::ScheduledDeviated(t) => t.earliest_departure_time(lower_bound, from, to),
            FlexTrip::ContinuousPickupDropOff(t) => t.earliest_departure_time(lower_bound, from, to),
        }
    }

    /// Latest time at or before `upper_bound` at which a rider who departed
    /// `from` can arrive at `to` after `ride_seconds` in the vehicle.
    pub fn latest_arrival_time(
        &self,
        upper_bound: i32,
        from: StopPosition,
        to: StopPosition,
        ride_seconds: i32,
    ) -> Option<i32> {
        match self {
            FlexTrip::Unscheduled(t) => t.latest_arrival_time(upper_bound, from, to, ride_seconds),
            FlexTrip::ScheduledDeviated(t) => t.latest_arrival_time(upper_bound, from, to),
            FlexTrip::ContinuousPickupDropOff(t) => t.latest_arrival_time(upper_bound, from, to),
        }
    }
}

/// Resolves a discrete boarding/alighting pair to row indices.
///
/// Fractional positions, positions past the end, `from > to`, and rows that
/// forbid boarding or alighting all yield `None`.
fn discrete_pair(
    stop_times: &[StopTimeWindow],
    from: StopPosition,
    to: StopPosition,
) -> Option<(usize, usize)> {
    let (from, to) = (from.as_index()?, to.as_index()?);
    if from > to || to >= stop_times.len() {
        return None;
    }
    if !stop_times[from].pickup.is_routable() || !stop_times[to].drop_off.is_routable() {
        return None;
    }
    Some((from, to))
}

/// A trip where every stop has a pickup/drop-off window.
#[derive(Debug, Clone, PartialEq)]
pub struct UnscheduledTrip {
    id: FeedScopedId,
    stop_times: Vec<StopTimeWindow>,
}

impl UnscheduledTrip {
    /// Wraps rows already known to all carry a window.
    pub(crate) fn new(id: FeedScopedId, stop_times: Vec<StopTimeWindow>) -> Self {
        Self { id, stop_times }
    }

    fn earliest_departure_time(
        &self,
        lower_bound: i32,
        from: StopPosition,
        to: StopPosition,
        ride_seconds: i32,
    ) -> Option<i32> {
        let (from, to) = discrete_pair(&self.stop_times, from, to)?;
        let from_window = self.stop_times[from].window?;
        let to_window = self.stop_times[to].window?;

        if from_window.end < lower_bound {
            return None;
        }
        let departure = lower_bound.max(from_window.start);
        // The ride must still end inside the drop-off window
        if departure.saturating_add(ride_seconds) > to_window.end {
            return None;
        }
        Some(departure)
    }

    fn latest_arrival_time(
        &self,
        upper_bound: i32,
        from: StopPosition,
        to: StopPosition,
        ride_seconds: i32,
    ) -> Option<i32> {
        let (from, to) = discrete_pair(&self.stop_times, from, to)?;
        let from_window = self.stop_times[from].window?;
        let to_window = self.stop_times[to].window?;

        if to_window.start > upper_bound {
            return None;
        }
        let arrival = upper_bound.min(to_window.end);
        if arrival.saturating_sub(ride_seconds) < from_window.start {
            return None;
        }
        Some(arrival)
    }
}

/// A trip with fixed timepoints at some stops and windows at others.
///
/// Each row gets one effective departure (fixed departure, else window
/// start) and one effective arrival (fixed arrival, else window end). A row
/// with neither stays unset and is skipped when scanning for a bound.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledDeviatedTrip {
    id: FeedScopedId,
    stop_times: Vec<StopTimeWindow>,
    departures: Vec<Option<i32>>,
    arrivals: Vec<Option<i32>>,
}

impl ScheduledDeviatedTrip {
    pub(crate) fn new(id: FeedScopedId, stop_times: Vec<StopTimeWindow>) -> Self {
        let departures = stop_times
            .iter()
            .map(|row| row.departure.or(row.window.map(|w| w.start)))
            .collect();
        let arrivals = stop_times
            .iter()
            .map(|row| row.arrival.or(row.window.map(|w| w.end)))
            .collect();
        Self {
            id,
            stop_times,
            departures,
            arrivals,
        }
    }

    /// Nearest defined departure at or before `from`.
    fn earliest_departure_time(
        &self,
        lower_bound: i32,
        from: StopPosition,
        to: StopPosition,
    ) -> Option<i32> {
        let (from, _) = discrete_pair(&self.stop_times, from, to)?;
        let departure = self.departures[..=from].iter().rev().find_map(|d| *d)?;
        (departure >= lower_bound).then_some(departure)
    }

    /// Nearest defined arrival at or after `to`.
    fn latest_arrival_time(
        &self,
        upper_bound: i32,
        from: StopPosition,
        to: StopPosition,
    ) -> Option<i32> {
        let (_, to) = discrete_pair(&self.stop_times, from, to)?;
        let arrival = self.arrivals[to..].iter().find_map(|a| *a)?;
        (arrival <= upper_bound).then_some(arrival)
    }
}

/// A trip with continuous pickup or drop-off along at least one segment.
///
/// Positions are fractional: the time at `2.25` is interpolated a quarter
/// of the way between the times at rows 2 and 3.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousPickupDropOffTrip {
    id: FeedScopedId,
    stop_times: Vec<StopTimeWindow>,
    departures: Vec<i32>,
    arrivals: Vec<i32>,
}

impl ContinuousPickupDropOffTrip {
    /// Wraps rows that all carry a time or a window.
    pub(crate) fn new(id: FeedScopedId, stop_times: Vec<StopTimeWindow>) -> Option<Self> {
        let departures = stop_times
            .iter()
            .map(StopTimeWindow::earliest_departure)
            .collect::<Option<Vec<_>>>()?;
        let arrivals = stop_times
            .iter()
            .map(StopTimeWindow::latest_arrival)
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            id,
            stop_times,
            departures,
            arrivals,
        })
    }

    /// Returns true if riders may board at `position`.
    fn can_board(&self, position: StopPosition) -> bool {
        let row = &self.stop_times[position.floor_index()];
        match position.as_index() {
            Some(_) => row.pickup.is_routable() || row.continuous_pickup.is_routable(),
            None => row.continuous_pickup.is_routable(),
        }
    }

    /// Returns true if riders may alight at `position`.
    fn can_alight(&self, position: StopPosition) -> bool {
        let row = &self.stop_times[position.floor_index()];
        match position.as_index() {
            Some(_) => row.drop_off.is_routable() || row.continuous_drop_off.is_routable(),
            None => row.continuous_drop_off.is_routable(),
        }
    }

    fn in_range(&self, position: StopPosition) -> bool {
        let last = self.stop_times.len().saturating_sub(1);
        match position.as_index() {
            Some(idx) => idx <= last,
            None => position.floor_index() < last,
        }
    }

    /// Interpolated (departure, arrival) for a ride from `from` to `to`.
    ///
    /// `None` unless the ride leaves strictly before it arrives.
    fn ride_times(&self, from: StopPosition, to: StopPosition) -> Option<(i32, i32)> {
        if from >= to || !self.in_range(from) || !self.in_range(to) {
            return None;
        }
        if !self.can_board(from) || !self.can_alight(to) {
            return None;
        }
        let departure = interpolate(&self.departures, from);
        let arrival = interpolate(&self.arrivals, to);
        (departure < arrival).then_some((departure, arrival))
    }

    fn earliest_departure_time(
        &self,
        lower_bound: i32,
        from: StopPosition,
        to: StopPosition,
    ) -> Option<i32> {
        let (departure, _) = self.ride_times(from, to)?;
        (departure >= lower_bound).then_some(departure)
    }

    fn latest_arrival_time(
        &self,
        upper_bound: i32,
        from: StopPosition,
        to: StopPosition,
    ) -> Option<i32> {
        let (_, arrival) = self.ride_times(from, to)?;
        (arrival <= upper_bound).then_some(arrival)
    }
}

/// Linear interpolation of `times` at a possibly fractional position.
///
/// The caller guarantees `position` is within range.
fn interpolate(times: &[i32], position: StopPosition) -> i32 {
    let idx = position.floor_index();
    let fraction = position.fraction();
    if fraction == 0.0 {
        return times[idx];
    }
    let (a, b) = (times[idx] as f64, times[idx + 1] as f64);
    (a + (b - a) * fraction).round() as i32
}
