//! Itinerary ranking for search results.
//!
//! Ranks itineraries so that the truncation filter keeps the most useful
//! options.

use std::cmp::{Ordering, Reverse};

use crate::domain::{FeedScopedId, Itinerary};

/// Rank itineraries by preference.
///
/// Depart-at searches rank by:
/// 1. Departure time (earlier is better)
/// 2. Number of transfers (fewer is better)
/// 3. Total duration (shorter is better)
///
/// Arrive-by searches rank by arrival time, latest first, then the same
/// tie-breaks.
///
/// Returns itineraries sorted best-first.
pub fn rank_itineraries(mut itineraries: Vec<Itinerary>, arrive_by: bool) -> Vec<Itinerary> {
    itineraries.sort_by(|a, b| {
        // Primary: the query's time
        let time_cmp = if arrive_by {
            Reverse(a.end_time()).cmp(&Reverse(b.end_time()))
        } else {
            a.start_time().cmp(&b.start_time())
        };
        if time_cmp != Ordering::Equal {
            return time_cmp;
        }

        // Secondary: fewer transfers
        let transfers_cmp = a.transfer_count().cmp(&b.transfer_count());
        if transfers_cmp != Ordering::Equal {
            return transfers_cmp;
        }

        // Tertiary: shorter duration
        a.duration().cmp(&b.duration())
    });

    itineraries
}

/// Flex trips ridden, in order.
fn trips_ridden(itinerary: &Itinerary) -> Vec<FeedScopedId> {
    itinerary
        .flex_legs()
        .filter_map(|l| l.as_flex())
        .map(|ride| ride.trip_id.clone())
        .collect()
}

/// Deduplicate itineraries that are effectively identical.
///
/// Two itineraries are duplicates if they depart and arrive at the same
/// times on the same flex trips. Range-search iterations that shift onto
/// the same window opening produce these.
///
/// Keeps the first of each group, preserving input order otherwise.
pub fn deduplicate(itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
    if itineraries.len() <= 1 {
        return itineraries;
    }

    let mut seen = std::collections::HashSet::new();
    itineraries
        .into_iter()
        .filter(|it| seen.insert((it.start_time(), it.end_time(), trips_ridden(it))))
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{FlexRide, Leg, LegKind, StopPosition, TimeFrame, VertexId};
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    fn make_itinerary(trip: u32, dep_mins: i64, duration_mins: i64) -> Itinerary {
        let start = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::minutes(dep_mins);
        let leg = Leg {
            kind: LegKind::Flex(FlexRide {
                trip_id: FeedScopedId::new("f", &trip.to_string()).unwrap(),
                from_stop: FeedScopedId::parse("f:a").unwrap(),
                to_stop: FeedScopedId::parse("f:b").unwrap(),
                from_position: StopPosition::from(0usize),
                to_position: StopPosition::from(1usize),
            }),
            from: VertexId(0),
            to: VertexId(1),
            start,
            end: start + Duration::minutes(duration_mins),
            distance_meters: 0.0,
        };
        Itinerary::new(vec![leg], TimeFrame::Shifted).unwrap()
    }

    fn itineraries_strategy() -> impl Strategy<Value = Vec<Itinerary>> {
        prop::collection::vec(
            (0u32..5, 0i64..1380, 5i64..120).prop_map(|(t, d, l)| make_itinerary(t, d, l)),
            0..15,
        )
    }

    proptest! {
        #[test]
        fn rank_is_sorted(itineraries in itineraries_strategy(), arrive_by in any::<bool>()) {
            let ranked = rank_itineraries(itineraries, arrive_by);
            for window in ranked.windows(2) {
                if arrive_by {
                    prop_assert!(window[0].end_time() >= window[1].end_time());
                } else {
                    prop_assert!(window[0].start_time() <= window[1].start_time());
                }
            }
        }

        #[test]
        fn rank_preserves_count(itineraries in itineraries_strategy(), arrive_by in any::<bool>()) {
            let len = itineraries.len();
            prop_assert_eq!(rank_itineraries(itineraries, arrive_by).len(), len);
        }

        #[test]
        fn deduplicate_is_idempotent(itineraries in itineraries_strategy()) {
            let once = deduplicate(itineraries);
            let twice = deduplicate(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
