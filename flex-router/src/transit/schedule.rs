//! Scheduled trips projected onto later service days.
//!
//! A search spanning several service days addresses every trip through one
//! time axis: seconds since the first day's midnight. A trip running on the
//! `k`th day after the first is seen through a [`TripPatternWithOffset`]
//! whose times are the canonical ones plus `k * 86 400`.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::{DomainError, FeedScopedId, SECONDS_PER_DAY, StopIndex};

/// The ordered stops a set of trips call at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripPattern {
    id: FeedScopedId,
    stop_indices: Vec<StopIndex>,
}

impl TripPattern {
    /// Creates a pattern over `stop_indices` in calling order.
    pub fn new(id: FeedScopedId, stop_indices: Vec<StopIndex>) -> Self {
        Self { id, stop_indices }
    }

    pub fn id(&self) -> &FeedScopedId {
        &self.id
    }

    /// Number of stop positions in the pattern.
    pub fn number_of_stops(&self) -> usize {
        self.stop_indices.len()
    }

    /// Stop at a pattern position.
    pub fn stop_index(&self, position: usize) -> Option<StopIndex> {
        self.stop_indices.get(position).copied()
    }
}

/// Canonical arrival and departure times of one trip, seconds since its
/// service day's midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripTimes {
    trip_id: FeedScopedId,
    arrivals: Vec<i32>,
    departures: Vec<i32>,
}

impl TripTimes {
    /// Creates trip times from per-position `(arrival, departure)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a departure is before its arrival or times go
    /// backwards between positions.
    pub fn new(trip_id: FeedScopedId, times: &[(i32, i32)]) -> Result<Self, DomainError> {
        let mut previous_departure = i32::MIN;
        for &(arrival, departure) in times {
            if departure < arrival {
                return Err(DomainError::InvalidStopTime(
                    "departure must not be before arrival",
                ));
            }
            if arrival < previous_departure {
                return Err(DomainError::InvalidStopTime(
                    "trip times must not go backwards",
                ));
            }
            previous_departure = departure;
        }

        Ok(Self {
            trip_id,
            arrivals: times.iter().map(|(a, _)| *a).collect(),
            departures: times.iter().map(|(_, d)| *d).collect(),
        })
    }

    pub fn trip_id(&self) -> &FeedScopedId {
        &self.trip_id
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    /// Canonical arrival at a position.
    pub fn arrival(&self, position: usize) -> Result<i32, DomainError> {
        self.arrivals
            .get(position)
            .copied()
            .ok_or(DomainError::StopPositionOutOfRange {
                position,
                len: self.len(),
            })
    }

    /// Canonical departure at a position.
    pub fn departure(&self, position: usize) -> Result<i32, DomainError> {
        self.departures
            .get(position)
            .copied()
            .ok_or(DomainError::StopPositionOutOfRange {
                position,
                len: self.len(),
            })
    }
}

/// A trip as seen by the fixed-schedule search.
pub trait TripSchedule {
    /// Arrival at a pattern position, seconds on the search's time axis.
    fn arrival(&self, position: usize) -> Result<i32, DomainError>;

    /// Departure at a pattern position, seconds on the search's time axis.
    fn departure(&self, position: usize) -> Result<i32, DomainError>;

    fn pattern(&self) -> &TripPattern;

    /// Canonical times, without any offset.
    fn original_trip_times(&self) -> &TripTimes;

    fn service_date(&self) -> NaiveDate;

    /// Find the pattern position at `stop_index` whose departure (or
    /// arrival) is exactly `time`.
    ///
    /// Callers derive `time` from this same schedule, so a miss is an
    /// internal inconsistency and is reported as an error.
    fn find_stop_position_in_pattern(
        &self,
        stop_index: StopIndex,
        time: i32,
        departure: bool,
    ) -> Result<usize, DomainError> {
        let pattern = self.pattern();
        for position in 0..pattern.number_of_stops() {
            if pattern.stop_index(position) != Some(stop_index) {
                continue;
            }
            let t = if departure {
                self.departure(position)?
            } else {
                self.arrival(position)?
            };
            if t == time {
                return Ok(position);
            }
        }
        Err(DomainError::NoStopPosition {
            stop_index,
            time,
            departure,
        })
    }
}

/// One trip of a pattern on one service date, shifted by that date's
/// distance from the first date of the search.
///
/// Borrows the pattern and times; two projections of the same trip with
/// different offsets compare unequal.
///
/// # Examples
///
/// ```
/// use flex_router::domain::{FeedScopedId, StopIndex};
/// use flex_router::transit::{TripPattern, TripPatternForDates, TripSchedule, TripTimes};
/// use chrono::NaiveDate;
/// use std::sync::Arc;
///
/// let id = |s: &str| FeedScopedId::parse(s).unwrap();
/// let pattern = Arc::new(TripPattern::new(id("f:p1"), vec![StopIndex(0), StopIndex(1)]));
/// let times = TripTimes::new(id("f:t1"), &[(3600, 3600), (4200, 4260)]).unwrap();
///
/// let monday = NaiveDate::from_ymd_opt(2024, 3, 18).unwrap();
/// let tuesday = monday.succ_opt().unwrap();
/// let dates = TripPatternForDates::new(
///     pattern,
///     vec![(monday, vec![times.clone()]), (tuesday, vec![times])],
/// )
/// .unwrap();
///
/// let schedules: Vec<_> = dates.trip_schedules().collect();
/// assert_eq!(schedules[0].departure(0).unwrap(), 3600);
/// assert_eq!(schedules[1].departure(0).unwrap(), 3600 + 86_400);
/// assert_ne!(schedules[0], schedules[1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripPatternWithOffset<'a> {
    pattern: &'a TripPattern,
    trip_times: &'a TripTimes,
    service_date: NaiveDate,
    seconds_offset: i32,
}

impl<'a> TripPatternWithOffset<'a> {
    /// Projects `trip_times` onto the search axis, `seconds_offset` later.
    pub fn new(
        pattern: &'a TripPattern,
        trip_times: &'a TripTimes,
        service_date: NaiveDate,
        seconds_offset: i32,
    ) -> Self {
        Self {
            pattern,
            trip_times,
            service_date,
            seconds_offset,
        }
    }

    pub fn seconds_offset(&self) -> i32 {
        self.seconds_offset
    }
}

impl TripSchedule for TripPatternWithOffset<'_> {
    fn arrival(&self, position: usize) -> Result<i32, DomainError> {
        Ok(self.trip_times.arrival(position)? + self.seconds_offset)
    }

    fn departure(&self, position: usize) -> Result<i32, DomainError> {
        Ok(self.trip_times.departure(position)? + self.seconds_offset)
    }

    fn pattern(&self) -> &TripPattern {
        self.pattern
    }

    fn original_trip_times(&self) -> &TripTimes {
        self.trip_times
    }

    fn service_date(&self) -> NaiveDate {
        self.service_date
    }
}

/// A pattern and the trips it runs on each service date of a search.
#[derive(Debug, Clone)]
pub struct TripPatternForDates {
    pattern: Arc<TripPattern>,
    /// Sorted by date, earliest first
    dates: Vec<(NaiveDate, Vec<TripTimes>)>,
}

impl TripPatternForDates {
    /// Group a pattern's trips by service date.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any trip's times don't cover exactly the pattern's
    /// stops.
    pub fn new(
        pattern: Arc<TripPattern>,
        mut dates: Vec<(NaiveDate, Vec<TripTimes>)>,
    ) -> Result<Self, DomainError> {
        let stops = pattern.number_of_stops();
        for times in dates.iter().flat_map(|(_, trips)| trips) {
            if times.len() != stops {
                return Err(DomainError::StopPositionOutOfRange {
                    position: times.len().saturating_sub(1),
                    len: stops,
                });
            }
        }
        dates.sort_by_key(|(date, _)| *date);
        Ok(Self { pattern, dates })
    }

    pub fn pattern(&self) -> &TripPattern {
        &self.pattern
    }

    /// First service date, the zero point of the offsets.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().map(|(date, _)| *date)
    }

    /// Every trip on every date, projected onto the first date's axis.
    pub fn trip_schedules(&self) -> impl Iterator<Item = TripPatternWithOffset<'_>> {
        let first = self.first_date();
        self.dates.iter().flat_map(move |(date, trips)| {
            let days = first.map_or(0, |f| date.signed_duration_since(f).num_days());
            let offset = (days as i32).saturating_mul(SECONDS_PER_DAY);
            trips
                .iter()
                .map(move |times| TripPatternWithOffset::new(&self.pattern, times, *date, offset))
        })
    }

    /// Number of trips across all dates.
    pub fn trip_count(&self) -> usize {
        self.dates.iter().map(|(_, trips)| trips.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> FeedScopedId {
        FeedScopedId::parse(s).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    /// Circular pattern calling at stop 7 twice
    fn pattern() -> TripPattern {
        TripPattern::new(
            id("f:loop"),
            vec![StopIndex(7), StopIndex(3), StopIndex(7)],
        )
    }

    fn times() -> TripTimes {
        TripTimes::new(id("f:t1"), &[(1000, 1000), (1500, 1560), (2000, 2000)]).unwrap()
    }

    #[test]
    fn offset_applies_to_every_position() {
        let (pattern, times) = (pattern(), times());
        let shifted = TripPatternWithOffset::new(&pattern, &times, date(16), SECONDS_PER_DAY);

        assert_eq!(shifted.arrival(1).unwrap(), 1500 + SECONDS_PER_DAY);
        assert_eq!(shifted.departure(1).unwrap(), 1560 + SECONDS_PER_DAY);
        assert_eq!(shifted.service_date(), date(16));
        assert_eq!(shifted.original_trip_times().arrival(1).unwrap(), 1500);
        assert_eq!(shifted.pattern().id(), &id("f:loop"));
    }

    #[test]
    fn out_of_range_position() {
        let (pattern, times) = (pattern(), times());
        let shifted = TripPatternWithOffset::new(&pattern, &times, date(15), 0);
        assert_eq!(
            shifted.arrival(3),
            Err(DomainError::StopPositionOutOfRange {
                position: 3,
                len: 3
            })
        );
    }

    #[test]
    fn find_position_matches_exact_time() {
        let (pattern, times) = (pattern(), times());
        let shifted = TripPatternWithOffset::new(&pattern, &times, date(16), SECONDS_PER_DAY);

        // Stop 7 appears twice; the time picks which visit
        assert_eq!(
            shifted.find_stop_position_in_pattern(StopIndex(7), 1000 + SECONDS_PER_DAY, true),
            Ok(0)
        );
        assert_eq!(
            shifted.find_stop_position_in_pattern(StopIndex(7), 2000 + SECONDS_PER_DAY, false),
            Ok(2)
        );
        assert_eq!(
            shifted.find_stop_position_in_pattern(StopIndex(3), 1560 + SECONDS_PER_DAY, true),
            Ok(1)
        );
    }

    #[test]
    fn find_position_miss_is_an_error() {
        let (pattern, times) = (pattern(), times());
        let shifted = TripPatternWithOffset::new(&pattern, &times, date(16), SECONDS_PER_DAY);

        // Canonical time without the offset does not match
        assert_eq!(
            shifted.find_stop_position_in_pattern(StopIndex(3), 1560, true),
            Err(DomainError::NoStopPosition {
                stop_index: StopIndex(3),
                time: 1560,
                departure: true,
            })
        );
        // Arrival time asked as a departure
        assert!(
            shifted
                .find_stop_position_in_pattern(StopIndex(3), 1500 + SECONDS_PER_DAY, true)
                .is_err()
        );
    }

    #[test]
    fn trip_times_validation() {
        assert!(TripTimes::new(id("f:t"), &[(100, 50)]).is_err());
        assert!(TripTimes::new(id("f:t"), &[(100, 200), (150, 160)]).is_err());
        assert!(TripTimes::new(id("f:t"), &[]).unwrap().is_empty());
    }

    #[test]
    fn pattern_for_dates_offsets_by_day() {
        let dates = TripPatternForDates::new(
            Arc::new(pattern()),
            vec![(date(17), vec![times()]), (date(15), vec![times(), times()])],
        )
        .unwrap();

        assert_eq!(dates.first_date(), Some(date(15)));
        assert_eq!(dates.trip_count(), 3);

        let offsets: Vec<_> = dates
            .trip_schedules()
            .map(|s| (s.service_date(), s.seconds_offset()))
            .collect();
        assert_eq!(
            offsets,
            vec![
                (date(15), 0),
                (date(15), 0),
                (date(17), 2 * SECONDS_PER_DAY)
            ]
        );
    }

    #[test]
    fn pattern_for_dates_rejects_mismatched_times() {
        let short = TripTimes::new(id("f:t2"), &[(0, 0), (60, 60)]).unwrap();
        let result = TripPatternForDates::new(Arc::new(pattern()), vec![(date(15), vec![short])]);
        assert!(matches!(
            result,
            Err(DomainError::StopPositionOutOfRange { len: 3, .. })
        ));
    }
}
