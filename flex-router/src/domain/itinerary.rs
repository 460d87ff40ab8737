//! Itinerary types.
//!
//! An `Itinerary` is a door-to-door trip: walk legs, flex legs and transfer
//! waits with absolute times. After construction the only mutation is a
//! uniform time-shift of every leg.

use chrono::{Duration, NaiveDateTime};

use super::{DomainError, FeedScopedId, StopPosition, VertexId};

/// Details of a leg ridden on a flex trip.
#[derive(Debug, Clone, PartialEq)]
pub struct FlexRide {
    /// The flex trip ridden
    pub trip_id: FeedScopedId,
    /// Boarding stop
    pub from_stop: FeedScopedId,
    /// Alighting stop
    pub to_stop: FeedScopedId,
    /// Boarding position within the trip
    pub from_position: StopPosition,
    /// Alighting position within the trip
    pub to_position: StopPosition,
}

/// What a leg is.
#[derive(Debug, Clone, PartialEq)]
pub enum LegKind {
    /// Walking on the street network
    Walk,
    /// Riding a flex trip
    Flex(FlexRide),
    /// Waiting out a minimum transfer time between two flex rides
    Transfer,
}

/// One leg of an itinerary.
///
/// # Invariants
///
/// - `end >= start`
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub kind: LegKind,
    pub from: VertexId,
    pub to: VertexId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Distance covered. Zero on flex legs whose calculator does not track
    /// distance, so zero there means unknown.
    pub distance_meters: f64,
}

impl Leg {
    /// Returns the leg duration.
    pub fn duration(&self) -> Duration {
        self.end.signed_duration_since(self.start)
    }

    /// Returns true if this is a walk leg.
    pub fn is_walk(&self) -> bool {
        matches!(self.kind, LegKind::Walk)
    }

    /// Returns true if this is a flex leg.
    pub fn is_flex(&self) -> bool {
        matches!(self.kind, LegKind::Flex(_))
    }

    /// Returns the flex ride if this is a flex leg.
    pub fn as_flex(&self) -> Option<&FlexRide> {
        match &self.kind {
            LegKind::Flex(ride) => Some(ride),
            _ => None,
        }
    }

    fn shift(&mut self, delta: Duration) {
        self.start += delta;
        self.end += delta;
    }
}

/// Which time frame an itinerary's instants are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFrame {
    /// Shifted to honor the query's depart-at/arrive-by time.
    Shifted,
    /// Untranslated: instants are as traversed, anchored at the query time,
    /// and have not been fitted to any trip's time windows.
    AsTraversed,
}

/// A complete itinerary.
///
/// # Invariants
///
/// - At least one leg
/// - Consecutive legs connect (`to` of one is `from` of the next)
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    legs: Vec<Leg>,
    frame: TimeFrame,
}

impl Itinerary {
    /// Constructs an itinerary from connected legs.
    ///
    /// # Errors
    ///
    /// Returns `Err` if there are no legs or consecutive legs don't connect.
    ///
    /// # Examples
    ///
    /// ```
    /// use flex_router::domain::{Itinerary, Leg, LegKind, TimeFrame, VertexId};
    /// use chrono::{Duration, NaiveDate};
    ///
    /// let t0 = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(8, 0, 0).unwrap();
    /// let walk = Leg {
    ///     kind: LegKind::Walk,
    ///     from: VertexId(1),
    ///     to: VertexId(2),
    ///     start: t0,
    ///     end: t0 + Duration::minutes(5),
    ///     distance_meters: 400.0,
    /// };
    ///
    /// let mut itinerary = Itinerary::new(vec![walk], TimeFrame::AsTraversed).unwrap();
    /// itinerary.time_shift_to_start_at(t0 + Duration::hours(1));
    /// assert_eq!(itinerary.start_time(), t0 + Duration::hours(1));
    /// assert_eq!(itinerary.frame(), TimeFrame::Shifted);
    /// ```
    pub fn new(legs: Vec<Leg>, frame: TimeFrame) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyItinerary);
        }

        for window in legs.windows(2) {
            if window[0].to != window[1].from {
                return Err(DomainError::LegsNotConnected(window[0].to, window[1].from));
            }
        }

        Ok(Itinerary { legs, frame })
    }

    /// Returns all legs in order.
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Returns the time frame the instants are in.
    pub fn frame(&self) -> TimeFrame {
        self.frame
    }

    /// Returns the departure time of the first leg.
    pub fn start_time(&self) -> NaiveDateTime {
        // Safe: validated non-empty at construction
        self.legs[0].start
    }

    /// Returns the arrival time of the last leg.
    pub fn end_time(&self) -> NaiveDateTime {
        // Safe: validated non-empty at construction
        self.legs[self.legs.len() - 1].end
    }

    /// Returns the total door-to-door duration.
    pub fn duration(&self) -> Duration {
        self.end_time().signed_duration_since(self.start_time())
    }

    /// Returns the first vertex.
    pub fn origin(&self) -> VertexId {
        self.legs[0].from
    }

    /// Returns the last vertex.
    pub fn destination(&self) -> VertexId {
        self.legs[self.legs.len() - 1].to
    }

    /// Returns all flex rides in order.
    pub fn flex_legs(&self) -> impl Iterator<Item = &Leg> {
        self.legs.iter().filter(|l| l.is_flex())
    }

    /// Returns the number of transfers between flex rides.
    pub fn transfer_count(&self) -> usize {
        self.flex_legs().count().saturating_sub(1)
    }

    /// Returns the total walking duration.
    pub fn walk_duration(&self) -> Duration {
        self.legs
            .iter()
            .filter(|l| l.is_walk())
            .map(Leg::duration)
            .sum()
    }

    /// Returns the total walking distance.
    pub fn walk_distance_meters(&self) -> f64 {
        self.legs
            .iter()
            .filter(|l| l.is_walk())
            .map(|l| l.distance_meters)
            .sum()
    }

    /// Shift every leg by the same amount.
    pub fn time_shift(&mut self, delta: Duration) {
        for leg in &mut self.legs {
            leg.shift(delta);
        }
        self.frame = TimeFrame::Shifted;
    }

    /// Shift every leg so that the first leg starts at `start`.
    pub fn time_shift_to_start_at(&mut self, start: NaiveDateTime) {
        let delta = start.signed_duration_since(self.start_time());
        self.time_shift(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn id(s: &str) -> FeedScopedId {
        FeedScopedId::parse(s).unwrap()
    }

    fn walk(from: usize, to: usize, start: NaiveDateTime, mins: i64, meters: f64) -> Leg {
        Leg {
            kind: LegKind::Walk,
            from: VertexId(from),
            to: VertexId(to),
            start,
            end: start + Duration::minutes(mins),
            distance_meters: meters,
        }
    }

    fn flex(from: usize, to: usize, start: NaiveDateTime, mins: i64) -> Leg {
        Leg {
            kind: LegKind::Flex(FlexRide {
                trip_id: id("f:trip"),
                from_stop: id("f:a"),
                to_stop: id("f:b"),
                from_position: StopPosition::from(0usize),
                to_position: StopPosition::from(1usize),
            }),
            from: VertexId(from),
            to: VertexId(to),
            start,
            end: start + Duration::minutes(mins),
            distance_meters: 0.0,
        }
    }

    #[test]
    fn single_leg() {
        let it = Itinerary::new(vec![walk(1, 2, t(8, 0), 5, 300.0)], TimeFrame::Shifted).unwrap();
        assert_eq!(it.legs().len(), 1);
        assert_eq!(it.start_time(), t(8, 0));
        assert_eq!(it.end_time(), t(8, 5));
        assert_eq!(it.duration(), Duration::minutes(5));
        assert_eq!(it.origin(), VertexId(1));
        assert_eq!(it.destination(), VertexId(2));
        assert_eq!(it.transfer_count(), 0);
    }

    #[test]
    fn walk_flex_walk() {
        let legs = vec![
            walk(1, 2, t(8, 0), 5, 300.0),
            flex(2, 3, t(8, 5), 20),
            walk(3, 4, t(8, 25), 3, 200.0),
        ];
        let it = Itinerary::new(legs, TimeFrame::Shifted).unwrap();

        assert_eq!(it.flex_legs().count(), 1);
        assert_eq!(it.transfer_count(), 0);
        assert_eq!(it.walk_duration(), Duration::minutes(8));
        assert_eq!(it.walk_distance_meters(), 500.0);
        assert_eq!(it.duration(), Duration::minutes(28));
    }

    #[test]
    fn two_flex_rides_count_one_transfer() {
        let legs = vec![flex(1, 2, t(8, 0), 10), flex(2, 3, t(8, 15), 10)];
        let it = Itinerary::new(legs, TimeFrame::AsTraversed).unwrap();
        assert_eq!(it.transfer_count(), 1);
    }

    #[test]
    fn empty_rejected() {
        assert!(matches!(
            Itinerary::new(vec![], TimeFrame::Shifted),
            Err(DomainError::EmptyItinerary)
        ));
    }

    #[test]
    fn disconnected_rejected() {
        let legs = vec![walk(1, 2, t(8, 0), 5, 0.0), walk(3, 4, t(8, 5), 5, 0.0)];
        assert_eq!(
            Itinerary::new(legs, TimeFrame::Shifted),
            Err(DomainError::LegsNotConnected(VertexId(2), VertexId(3)))
        );
    }

    #[test]
    fn time_shift_moves_every_leg() {
        let legs = vec![walk(1, 2, t(8, 0), 5, 300.0), flex(2, 3, t(8, 5), 20)];
        let mut it = Itinerary::new(legs, TimeFrame::AsTraversed).unwrap();
        let before = it.duration();

        it.time_shift(Duration::minutes(90));

        assert_eq!(it.start_time(), t(9, 30));
        assert_eq!(it.legs()[1].start, t(9, 35));
        assert_eq!(it.end_time(), t(9, 55));
        assert_eq!(it.duration(), before);
        assert_eq!(it.frame(), TimeFrame::Shifted);
    }

    #[test]
    fn time_shift_to_start_at_backwards() {
        let legs = vec![walk(1, 2, t(8, 0), 5, 300.0)];
        let mut it = Itinerary::new(legs, TimeFrame::AsTraversed).unwrap();
        it.time_shift_to_start_at(t(7, 0));
        assert_eq!(it.start_time(), t(7, 0));
        assert_eq!(it.end_time(), t(7, 5));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    proptest! {
        /// Shifting preserves every leg's duration and the gaps between legs
        #[test]
        fn shift_preserves_shape(
            durations in prop::collection::vec(0i64..3600, 1..6),
            shift in -86_400i64..86_400,
        ) {
            let mut start = base();
            let mut legs = Vec::new();
            for (i, d) in durations.iter().enumerate() {
                let end = start + Duration::seconds(*d);
                legs.push(Leg {
                    kind: LegKind::Walk,
                    from: VertexId(i),
                    to: VertexId(i + 1),
                    start,
                    end,
                    distance_meters: 0.0,
                });
                start = end;
            }
            let original = Itinerary::new(legs, TimeFrame::AsTraversed).unwrap();
            let mut shifted = original.clone();
            shifted.time_shift(Duration::seconds(shift));

            for (a, b) in original.legs().iter().zip(shifted.legs()) {
                prop_assert_eq!(a.duration(), b.duration());
                prop_assert_eq!(b.start.signed_duration_since(a.start), Duration::seconds(shift));
            }
        }
    }
}
