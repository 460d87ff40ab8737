//! Result-list filters applied after ranking.

use std::fmt;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::Itinerary;

/// Observer told about the first itinerary a filter drops.
pub type DropSubscriber = Box<dyn Fn(&Itinerary) + Send + Sync>;

/// One named stage of the result pipeline.
pub trait ItineraryFilter: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Filter an already-ranked list.
    fn filter(&self, itineraries: Vec<Itinerary>) -> Vec<Itinerary>;

    /// Whether this stage can shrink the list.
    fn removes_itineraries(&self) -> bool {
        true
    }
}

/// Caps a ranked list by count and by a latest-departure cutoff.
///
/// Keeps itineraries while the index is below `max_limit` and the
/// itinerary departs no later than the cutoff. The first itinerary is
/// exempt from the cutoff, so the best result always survives. The first
/// itinerary dropped is passed to the subscriber, if any.
pub struct MaxLimitFilter {
    name: String,
    max_limit: usize,
    latest_departure_time_limit: Option<NaiveDateTime>,
    changed_subscriber: Option<DropSubscriber>,
}

impl MaxLimitFilter {
    pub fn new(name: impl Into<String>, max_limit: usize) -> Self {
        Self {
            name: name.into(),
            max_limit,
            latest_departure_time_limit: None,
            changed_subscriber: None,
        }
    }

    /// Drop itineraries departing after `limit` (except the first).
    pub fn with_latest_departure_time_limit(mut self, limit: NaiveDateTime) -> Self {
        self.latest_departure_time_limit = Some(limit);
        self
    }

    /// Call `subscriber` with the first dropped itinerary.
    pub fn with_changed_subscriber(
        mut self,
        subscriber: impl Fn(&Itinerary) + Send + Sync + 'static,
    ) -> Self {
        self.changed_subscriber = Some(Box::new(subscriber));
        self
    }

    pub fn max_limit(&self) -> usize {
        self.max_limit
    }

    pub fn latest_departure_time_limit(&self) -> Option<NaiveDateTime> {
        self.latest_departure_time_limit
    }

    fn is_beyond_limit(&self, index: usize, itinerary: &Itinerary) -> bool {
        if index >= self.max_limit {
            return true;
        }
        match self.latest_departure_time_limit {
            Some(limit) => index > 0 && itinerary.start_time() > limit,
            None => false,
        }
    }
}

impl fmt::Debug for MaxLimitFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaxLimitFilter")
            .field("name", &self.name)
            .field("max_limit", &self.max_limit)
            .field(
                "latest_departure_time_limit",
                &self.latest_departure_time_limit,
            )
            .field("has_subscriber", &self.changed_subscriber.is_some())
            .finish()
    }
}

impl ItineraryFilter for MaxLimitFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn filter(&self, mut itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
        let Some(cut) = itineraries
            .iter()
            .enumerate()
            .position(|(i, it)| self.is_beyond_limit(i, it))
        else {
            return itineraries;
        };

        if let Some(subscriber) = &self.changed_subscriber {
            subscriber(&itineraries[cut]);
        }
        debug!(
            filter = %self.name,
            kept = cut,
            dropped = itineraries.len() - cut,
            "truncated itineraries"
        );
        itineraries.truncate(cut);
        itineraries
    }
}

/// Filters applied in insertion order.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn ItineraryFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn with(mut self, filter: impl ItineraryFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Stage names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn filter(&self, itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
        self.filters.iter().fold(itineraries, |acc, stage| {
            if acc.is_empty() && stage.removes_itineraries() {
                return acc;
            }
            stage.filter(acc)
        })
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeedScopedId, FlexRide, Leg, LegKind, StopPosition, TimeFrame, VertexId};
    use chrono::{Duration, NaiveDate};
    use std::sync::{Arc, Mutex};

    fn cutoff() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn departing(offset_mins: i64) -> Itinerary {
        let start = cutoff() + Duration::minutes(offset_mins);
        let leg = Leg {
            kind: LegKind::Flex(FlexRide {
                trip_id: FeedScopedId::parse("f:trip").unwrap(),
                from_stop: FeedScopedId::parse("f:a").unwrap(),
                to_stop: FeedScopedId::parse("f:b").unwrap(),
                from_position: StopPosition::from(0usize),
                to_position: StopPosition::from(1usize),
            }),
            from: VertexId(0),
            to: VertexId(1),
            start,
            end: start + Duration::minutes(30),
            distance_meters: 0.0,
        };
        Itinerary::new(vec![leg], TimeFrame::Shifted).unwrap()
    }

    fn recording(filter: MaxLimitFilter) -> (MaxLimitFilter, Arc<Mutex<Vec<NaiveDateTime>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let filter =
            filter.with_changed_subscriber(move |it| sink.lock().unwrap().push(it.start_time()));
        (filter, seen)
    }

    #[test]
    fn count_and_cutoff_drop_the_tail() {
        let (filter, seen) = recording(
            MaxLimitFilter::new("max-limit", 2).with_latest_departure_time_limit(cutoff()),
        );

        let result = filter.filter(vec![departing(-10), departing(5), departing(20)]);

        // The second departs after the cutoff, so only the first survives
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].start_time(), cutoff() - Duration::minutes(10));
        assert_eq!(*seen.lock().unwrap(), vec![cutoff() + Duration::minutes(5)]);
    }

    #[test]
    fn count_limit_reports_first_dropped() {
        let (filter, seen) = recording(
            MaxLimitFilter::new("max-limit", 2)
                .with_latest_departure_time_limit(cutoff() + Duration::minutes(10)),
        );

        let result = filter.filter(vec![departing(-10), departing(5), departing(20)]);

        assert_eq!(result.len(), 2);
        assert_eq!(result[1].start_time(), cutoff() + Duration::minutes(5));
        assert_eq!(*seen.lock().unwrap(), vec![cutoff() + Duration::minutes(20)]);
    }

    #[test]
    fn first_itinerary_exempt_from_cutoff() {
        let (filter, seen) = recording(
            MaxLimitFilter::new("max-limit", 5).with_latest_departure_time_limit(cutoff()),
        );

        let result = filter.filter(vec![departing(30)]);

        assert_eq!(result.len(), 1);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn short_list_unchanged() {
        let (filter, seen) = recording(
            MaxLimitFilter::new("max-limit", 3).with_latest_departure_time_limit(cutoff()),
        );
        let input = vec![departing(-20), departing(-5), departing(0)];

        let result = filter.filter(input.clone());

        assert_eq!(result, input);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn no_cutoff_only_counts() {
        let filter = MaxLimitFilter::new("max-limit", 1);
        let result = filter.filter(vec![departing(0), departing(600)]);
        assert_eq!(result.len(), 1);
        assert_eq!(filter.latest_departure_time_limit(), None);
    }

    #[test]
    fn chain_runs_in_order() {
        let chain = FilterChain::new()
            .with(MaxLimitFilter::new("first", 3))
            .with(MaxLimitFilter::new("second", 1));

        assert_eq!(chain.names(), vec!["first", "second"]);
        assert_eq!(chain.len(), 2);

        let result = chain.filter(vec![departing(0), departing(1), departing(2), departing(3)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].start_time(), cutoff());
    }

    #[test]
    fn empty_chain_is_identity() {
        let chain = FilterChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.filter(vec![departing(0)]).len(), 1);
    }
}
