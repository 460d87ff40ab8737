//! Stop-time rows of a trip.
//!
//! A `StopTimeWindow` is one stop on a trip: either a fixed timepoint with
//! arrival/departure offsets, a flexible pickup/drop-off window, or (for
//! malformed input) neither. Rows are kept in trip order; that order is
//! significant and is never re-sorted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{DomainError, FeedScopedId, Stop};

/// Pickup or drop-off policy at a stop, or along a continuous segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PickDrop {
    /// Regularly scheduled.
    #[default]
    Scheduled,
    /// Not available.
    NotAvailable,
    /// Must phone the agency ahead.
    CallAhead,
    /// Flag stop: coordinate with the driver.
    CoordinateWithDriver,
}

impl PickDrop {
    /// Returns true if riders may board or alight under this policy.
    pub fn is_routable(self) -> bool {
        self != PickDrop::NotAvailable
    }
}

/// A flexible pickup/drop-off window, seconds since service-day midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlexWindow {
    pub start: i32,
    pub end: i32,
}

impl FlexWindow {
    /// Creates a window, rejecting `end < start`.
    pub fn new(start: i32, end: i32) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::InvalidStopTime(
                "flex window end must not be before start",
            ));
        }
        Ok(Self { start, end })
    }

    /// Returns true if `time` falls within the window (inclusive).
    pub fn contains(&self, time: i32) -> bool {
        (self.start..=self.end).contains(&time)
    }
}

/// One row of a trip's stop sequence.
///
/// # Invariants
///
/// - `window.end >= window.start` when a window is present
/// - `departure >= arrival` when both fixed times are present
#[derive(Debug, Clone, PartialEq)]
pub struct StopTimeWindow {
    /// The stop (shared, never owned by the trip)
    pub stop: Arc<Stop>,
    /// Fixed arrival, seconds since service-day midnight
    pub arrival: Option<i32>,
    /// Fixed departure, seconds since service-day midnight
    pub departure: Option<i32>,
    /// Flexible pickup/drop-off window
    pub window: Option<FlexWindow>,
    /// Boarding policy at this stop
    pub pickup: PickDrop,
    /// Alighting policy at this stop
    pub drop_off: PickDrop,
    /// Boarding policy along the segment starting here
    pub continuous_pickup: PickDrop,
    /// Alighting policy along the segment starting here
    pub continuous_drop_off: PickDrop,
    /// Booking rule for call-ahead service
    pub booking_rule: Option<FeedScopedId>,
}

impl StopTimeWindow {
    /// Creates a row at `stop` with no times and no continuous service.
    pub fn new(stop: Arc<Stop>) -> Self {
        Self {
            stop,
            arrival: None,
            departure: None,
            window: None,
            pickup: PickDrop::Scheduled,
            drop_off: PickDrop::Scheduled,
            continuous_pickup: PickDrop::NotAvailable,
            continuous_drop_off: PickDrop::NotAvailable,
            booking_rule: None,
        }
    }

    /// Creates a fixed timepoint row.
    ///
    /// # Examples
    ///
    /// ```
    /// use flex_router::domain::{FeedScopedId, Stop, StopTimeWindow, Coordinate};
    /// use std::sync::Arc;
    ///
    /// let stop = Arc::new(Stop::point(
    ///     FeedScopedId::parse("f:1").unwrap(),
    ///     "Central",
    ///     Coordinate::new(59.9, 10.7),
    /// ));
    ///
    /// let row = StopTimeWindow::timepoint(stop, 3600, 3660).unwrap();
    /// assert!(row.is_timepoint());
    /// assert!(!row.is_flexible());
    ///
    /// // Departure before arrival is rejected
    /// # let stop = row.stop.clone();
    /// assert!(StopTimeWindow::timepoint(stop, 3660, 3600).is_err());
    /// ```
    pub fn timepoint(stop: Arc<Stop>, arrival: i32, departure: i32) -> Result<Self, DomainError> {
        if departure < arrival {
            return Err(DomainError::InvalidStopTime(
                "departure must not be before arrival",
            ));
        }
        let mut row = Self::new(stop);
        row.arrival = Some(arrival);
        row.departure = Some(departure);
        Ok(row)
    }

    /// Creates a flexible-window row.
    pub fn flexible(stop: Arc<Stop>, start: i32, end: i32) -> Result<Self, DomainError> {
        let mut row = Self::new(stop);
        row.window = Some(FlexWindow::new(start, end)?);
        Ok(row)
    }

    /// Returns true if the row has a fixed arrival or departure time.
    pub fn is_timepoint(&self) -> bool {
        self.arrival.is_some() || self.departure.is_some()
    }

    /// Returns true if the row has a flexible window.
    pub fn is_flexible(&self) -> bool {
        self.window.is_some()
    }

    /// Returns true if the row has neither fixed times nor a window.
    pub fn is_untimed(&self) -> bool {
        !self.is_timepoint() && !self.is_flexible()
    }

    /// Returns true if continuous pickup or drop-off is offered from this row.
    pub fn is_continuous(&self) -> bool {
        self.continuous_pickup.is_routable() || self.continuous_drop_off.is_routable()
    }

    /// Earliest time a rider can be picked up here.
    ///
    /// Fixed departure if present, otherwise the window start.
    pub fn earliest_departure(&self) -> Option<i32> {
        self.departure
            .or(self.arrival)
            .or(self.window.map(|w| w.start))
    }

    /// Latest time a rider is guaranteed to be dropped off here.
    ///
    /// Fixed arrival if present, otherwise the window end.
    pub fn latest_arrival(&self) -> Option<i32> {
        self.arrival
            .or(self.departure)
            .or(self.window.map(|w| w.end))
    }
}
