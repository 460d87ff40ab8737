//! Unit tests for the flex range search.

use super::*;
use crate::domain::{
    Coordinate, FeedScopedId, FlexServiceDate, PickDrop, Stop, StopPosition, StopTimeWindow,
    TimeFrame, Transfer, TransferType, Vertex, VertexId,
};
use crate::flex::{
    FlexPath, FlexPathCalculator, FlexTrip, FlexTripKind, NearbyStop, StreetEdge, WalkEdge,
    classify,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Calculator with a fixed ride duration that counts its calls.
#[derive(Default)]
struct FixedCalculator {
    calls: AtomicUsize,
}

impl FlexPathCalculator for FixedCalculator {
    fn calculate_flex_path(
        &self,
        _from: &Vertex,
        _to: &Vertex,
        _from_pos: StopPosition,
        _to_pos: StopPosition,
    ) -> Option<FlexPath> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(FlexPath::new(1000, 600))
    }
}

fn id(s: &str) -> FeedScopedId {
    FeedScopedId::parse(s).unwrap()
}

fn vertex(n: usize) -> Vertex {
    Vertex::new(VertexId(n), Coordinate::new(59.9 + n as f64 * 0.001, 10.7))
}

fn stop(s: &str) -> Arc<Stop> {
    Arc::new(Stop::point(id(s), s, Coordinate::new(59.9, 10.7)))
}

fn walk(from: usize, to: usize, secs: i32) -> Arc<dyn StreetEdge> {
    Arc::new(WalkEdge::new(vertex(from), vertex(to), 80.0, secs))
}

fn start_of_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn at(secs: i64) -> NaiveDateTime {
    start_of_time() + Duration::seconds(secs)
}

fn today() -> FlexServiceDate {
    FlexServiceDate::new(start_of_time().date(), start_of_time())
}

fn unscheduled(trip: &str, from: &str, to: &str) -> Arc<FlexTrip> {
    Arc::new(
        classify(
            id(trip),
            vec![
                StopTimeWindow::flexible(stop(from), 1000, 5000).unwrap(),
                StopTimeWindow::flexible(stop(to), 1000, 9000).unwrap(),
            ],
        )
        .unwrap(),
    )
}

/// Walk 1 -> 2 (120s), ride A -> B (600s), walk 3 -> 4 (60s)
fn direct_candidate() -> DirectCandidate {
    DirectCandidate {
        access: FlexAccessEgress::new(
            NearbyStop::access(stop("f:a"), vertex(1), vec![walk(1, 2, 120)]).unwrap(),
            unscheduled("f:trip", "f:a", "f:b"),
            StopPosition::from(0usize),
            StopPosition::from(1usize),
            stop("f:b"),
            today(),
        ),
        egress: NearbyStop::egress(stop("f:b"), vertex(3), vec![walk(3, 4, 60)]),
    }
}

fn router(config: RoutingConfig) -> FlexRouter {
    FlexRouter::new(config, Arc::new(FixedCalculator::default())).unwrap()
}

fn config(window_mins: i64, pool: usize) -> RoutingConfig {
    RoutingConfig {
        search_window_mins: window_mins,
        search_thread_pool_size: pool,
        ..RoutingConfig::default()
    }
}

#[test]
fn iteration_targets_follow_direction() {
    let router = router(config(5, 0));

    let later = router.iteration_targets(&FlexQuery::depart_at(500, start_of_time()));
    assert_eq!(later, vec![500, 560, 620, 680, 740, 800]);

    let earlier = router.iteration_targets(&FlexQuery::arrive_by(500, start_of_time()));
    assert_eq!(earlier, vec![500, 440, 380, 320, 260, 200]);
}

#[test]
fn depart_at_range_search() {
    let router = router(RoutingConfig::default());
    let query = FlexQuery::depart_at(500, start_of_time());

    let result = router.direct_itineraries(&[direct_candidate()], &query);

    // Iterations up to 860s all snap to the 1000s window opening
    assert_eq!(result.iterations, 41);
    assert_eq!(result.itineraries_built, 41);
    assert_eq!(result.itineraries.len(), 20);
    assert_eq!(result.itineraries[0].start_time(), at(880));
    assert_eq!(result.itineraries[1].start_time(), at(920));
    assert_eq!(result.itineraries[19].start_time(), at(2000));

    for window in result.itineraries.windows(2) {
        assert!(window[0].start_time() < window[1].start_time());
    }
    for it in &result.itineraries {
        assert_eq!(it.frame(), TimeFrame::Shifted);
        assert!(it.start_time() >= query.target_time());
        assert_eq!(it.duration(), Duration::seconds(120 + 600 + 60));
    }
}

#[test]
fn depart_at_cutoff_keeps_best_result() {
    let router = router(config(5, 0));
    let query = FlexQuery::depart_at(500, start_of_time());

    let result = router.direct_itineraries(&[direct_candidate()], &query);

    // Every iteration departs at 880s, past the 800s cutoff
    assert_eq!(result.itineraries_built, 6);
    assert_eq!(result.itineraries.len(), 1);
    assert_eq!(result.itineraries[0].start_time(), at(880));
}

#[test]
fn arrive_by_range_search() {
    let router = router(RoutingConfig::default());
    let query = FlexQuery::arrive_by(8000, start_of_time());

    let result = router.direct_itineraries(&[direct_candidate()], &query);

    assert_eq!(result.itineraries.len(), 20);
    assert_eq!(result.itineraries[0].end_time(), at(8000));
    assert_eq!(result.itineraries[1].end_time(), at(7940));
    assert_eq!(result.itineraries[19].end_time(), at(8000 - 19 * 60));
    for it in &result.itineraries {
        assert!(it.end_time() <= query.target_time());
    }
}

#[test]
fn thread_pool_matches_sequential() {
    let query = FlexQuery::depart_at(500, start_of_time());
    let candidates = [direct_candidate()];

    let sequential = router(config(30, 0)).direct_itineraries(&candidates, &query);
    let pooled = router(config(30, 2)).direct_itineraries(&candidates, &query);

    assert_eq!(sequential.itineraries, pooled.itineraries);
    assert_eq!(sequential.itineraries_built, pooled.itineraries_built);
}

#[test]
fn no_candidates() {
    let router = router(RoutingConfig::default());
    let result = router.direct_itineraries(&[], &FlexQuery::depart_at(500, start_of_time()));

    assert!(result.itineraries.is_empty());
    assert_eq!(result.iterations, 0);
}

#[test]
fn infeasible_candidate_omitted() {
    let router = router(config(5, 0));

    // Pickup window closes at 5000s
    let result =
        router.direct_itineraries(&[direct_candidate()], &FlexQuery::depart_at(6000, start_of_time()));

    assert!(result.itineraries.is_empty());
    assert_eq!(result.iterations, 6);
}

#[test]
fn rejects_invalid_config() {
    let bad = RoutingConfig {
        max_itineraries: 0,
        ..RoutingConfig::default()
    };
    let result = FlexRouter::new(bad, Arc::new(FixedCalculator::default()));
    assert!(matches!(result, Err(RouterError::Config(_))));
}

#[test]
fn direct_paths_router() {
    let router = FlexRouter::with_direct_paths(RoutingConfig::default()).unwrap();
    let result =
        router.direct_itineraries(&[direct_candidate()], &FlexQuery::depart_at(500, start_of_time()));

    assert!(!result.itineraries.is_empty());
    assert_eq!(result.itineraries[0].start_time(), at(880));
}

#[test]
fn continuous_trip_rides_its_own_schedule() {
    // A at 1000s, B at 1400s, riders may board and alight anywhere between
    let rows = [("f:a", 1000), ("f:b", 1400)]
        .into_iter()
        .map(|(s, t)| {
            let mut row = StopTimeWindow::timepoint(stop(s), t, t).unwrap();
            row.continuous_pickup = PickDrop::Scheduled;
            row.continuous_drop_off = PickDrop::Scheduled;
            row
        })
        .collect();
    let trip = Arc::new(classify(id("f:cont"), rows).unwrap());
    assert_eq!(trip.kind(), FlexTripKind::ContinuousPickupDropOff);

    let candidate = DirectCandidate {
        access: FlexAccessEgress::new(
            NearbyStop::access(stop("f:a"), vertex(1), vec![walk(1, 2, 120)]).unwrap(),
            trip,
            StopPosition::from(0usize),
            StopPosition::new(0.5).unwrap(),
            stop("f:b"),
            today(),
        ),
        egress: NearbyStop::egress(stop("f:b"), vertex(3), vec![walk(3, 4, 60)]),
    };

    let router = FlexRouter::with_direct_paths(config(5, 0)).unwrap();
    let result = router.direct_itineraries(&[candidate], &FlexQuery::depart_at(500, start_of_time()));

    assert_eq!(result.itineraries.len(), 1);
    let it = &result.itineraries[0];
    // Halfway along the 400s segment, not the straight-line estimate
    assert_eq!(it.legs()[1].start, at(1000));
    assert_eq!(it.legs()[1].duration(), Duration::seconds(200));
    assert_eq!(it.start_time(), at(880));
    assert_eq!(it.end_time(), at(1000 + 200 + 60));
}

mod transfers {
    use super::*;

    /// A -> T on the first trip, T -> D on the second, walk 7 -> 8 at the end
    fn candidate(transfer_type: TransferType) -> TransferCandidate {
        let direct = direct_candidate();
        TransferCandidate {
            access: direct.access.with_transfer_stop(stop("f:t")),
            transfer: Transfer::new(id("f:t"), id("f:t"), transfer_type, 120),
            egress: FlexAccessEgress::new(
                NearbyStop::egress(stop("f:d"), vertex(7), vec![walk(7, 8, 60)]),
                unscheduled("f:trip2", "f:t", "f:d"),
                StopPosition::from(0usize),
                StopPosition::from(1usize),
                stop("f:t"),
                today(),
            ),
        }
    }

    fn transfer_router() -> FlexRouter {
        router(RoutingConfig::default())
            .with_stop_vertices(HashMap::from([(id("f:t"), vertex(5))]))
    }

    #[test]
    fn supported_transfers_only() {
        let router = transfer_router();
        let candidates = [
            candidate(TransferType::MinTime),
            candidate(TransferType::Recommended),
            candidate(TransferType::Guaranteed),
        ];

        let found =
            router.transfer_itineraries(&candidates, &FlexQuery::depart_at(1000, start_of_time()));

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].legs().len(), 5);
        assert_eq!(found[0].duration(), Duration::seconds(120 + 600 + 120 + 600 + 60));
        assert_eq!(found[1].legs().len(), 4);
        for it in &found {
            assert_eq!(it.frame(), TimeFrame::AsTraversed);
            assert_eq!(it.start_time(), at(1000));
            assert_eq!(it.transfer_count(), 1);
        }
    }

    #[test]
    fn missing_stop_vertex() {
        let router = router(RoutingConfig::default());
        let found = router.transfer_itineraries(
            &[candidate(TransferType::MinTime)],
            &FlexQuery::depart_at(1000, start_of_time()),
        );
        assert!(found.is_empty());
    }
}
