//! Flex path calculation.
//!
//! A path calculator answers "how long does the flex vehicle take between
//! these two vertices, boarding and alighting at these positions". `None`
//! means the pair is unreachable.

use std::fmt;
use std::sync::Arc;

use super::FlexTrip;
use crate::domain::{StopPosition, Vertex};

/// Distance and duration of a flex ride.
///
/// A `distance_meters` of zero means the calculator does not track
/// distance, not that the ride is zero meters long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlexPath {
    pub distance_meters: u32,
    pub duration_seconds: i32,
}

impl FlexPath {
    /// Creates a path.
    pub fn new(distance_meters: u32, duration_seconds: i32) -> Self {
        Self {
            distance_meters,
            duration_seconds,
        }
    }

    /// Returns the distance if the calculator tracked it.
    pub fn known_distance(&self) -> Option<u32> {
        (self.distance_meters > 0).then_some(self.distance_meters)
    }
}

/// Computes flex paths between vertices.
pub trait FlexPathCalculator: Send + Sync {
    /// Path from `from` to `to`, boarding at `from_pos` and alighting at
    /// `to_pos`, or `None` if unreachable.
    fn calculate_flex_path(
        &self,
        from: &Vertex,
        to: &Vertex,
        from_pos: StopPosition,
        to_pos: StopPosition,
    ) -> Option<FlexPath>;
}

impl<'a> fmt::Debug for dyn FlexPathCalculator + 'a {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn FlexPathCalculator")
    }
}

impl<C: FlexPathCalculator + ?Sized> FlexPathCalculator for Arc<C> {
    fn calculate_flex_path(
        &self,
        from: &Vertex,
        to: &Vertex,
        from_pos: StopPosition,
        to_pos: StopPosition,
    ) -> Option<FlexPath> {
        (**self).calculate_flex_path(from, to, from_pos, to_pos)
    }
}

/// Path calculator for continuous pickup/drop-off trips.
///
/// Duration comes from the trip's own interpolated schedule; the street
/// network is not consulted and distance is not tracked.
#[derive(Debug, Clone)]
pub struct ContinuousStopsPathCalculator {
    trip: Arc<FlexTrip>,
}

impl ContinuousStopsPathCalculator {
    /// Creates a calculator for `trip`.
    pub fn new(trip: Arc<FlexTrip>) -> Self {
        Self { trip }
    }
}

impl FlexPathCalculator for ContinuousStopsPathCalculator {
    fn calculate_flex_path(
        &self,
        _from: &Vertex,
        _to: &Vertex,
        from_pos: StopPosition,
        to_pos: StopPosition,
    ) -> Option<FlexPath> {
        let departure = self
            .trip
            .earliest_departure_time(i32::MIN, from_pos, to_pos, 0)?;
        let arrival = self
            .trip
            .latest_arrival_time(i32::MAX, from_pos, to_pos, 0)?;

        if departure >= arrival {
            return None;
        }
        Some(FlexPath::new(0, arrival - departure))
    }
}

/// Straight-line path calculator.
///
/// Duration is the great-circle distance at `flex_speed_mps`, plus a fixed
/// `extra_time_secs` for pickup and drop-off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectPathCalculator {
    flex_speed_mps: f64,
    extra_time_secs: i32,
}

impl DirectPathCalculator {
    pub const DEFAULT_FLEX_SPEED_MPS: f64 = 8.0;
    pub const DEFAULT_EXTRA_TIME_SECS: i32 = 300;

    /// Creates a calculator. Non-positive speeds fall back to the default.
    pub fn new(flex_speed_mps: f64, extra_time_secs: i32) -> Self {
        let flex_speed_mps = if flex_speed_mps.is_finite() && flex_speed_mps > 0.0 {
            flex_speed_mps
        } else {
            Self::DEFAULT_FLEX_SPEED_MPS
        };
        Self {
            flex_speed_mps,
            extra_time_secs,
        }
    }
}

impl Default for DirectPathCalculator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FLEX_SPEED_MPS, Self::DEFAULT_EXTRA_TIME_SECS)
    }
}

impl FlexPathCalculator for DirectPathCalculator {
    fn calculate_flex_path(
        &self,
        from: &Vertex,
        to: &Vertex,
        _from_pos: StopPosition,
        _to_pos: StopPosition,
    ) -> Option<FlexPath> {
        let distance = from.coordinate.distance_meters(&to.coordinate);
        let duration = (distance / self.flex_speed_mps).round() as i32 + self.extra_time_secs;
        Some(FlexPath::new(distance.round() as u32, duration))
    }
}

/// A street network able to find driving paths between vertices.
pub trait StreetNetwork: Send + Sync {
    /// Shortest driving path, or `None` if `to` is not reachable.
    fn shortest_path(&self, from: &Vertex, to: &Vertex) -> Option<FlexPath>;
}

/// Path calculator backed by a street network search.
#[derive(Debug, Clone)]
pub struct StreetPathCalculator<N> {
    network: N,
}

impl<N: StreetNetwork> StreetPathCalculator<N> {
    /// Creates a calculator over `network`.
    pub fn new(network: N) -> Self {
        Self { network }
    }
}

impl<N: StreetNetwork> FlexPathCalculator for StreetPathCalculator<N> {
    fn calculate_flex_path(
        &self,
        from: &Vertex,
        to: &Vertex,
        _from_pos: StopPosition,
        _to_pos: StopPosition,
    ) -> Option<FlexPath> {
        if from.id == to.id {
            return None;
        }
        self.network.shortest_path(from, to)
    }
}
