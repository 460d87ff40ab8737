//! Access/egress templates: one flex ride joined to the rider's walk.
//!
//! A template binds a walk result, a flex trip, boarding and alighting
//! positions, the stop where the ride meets the rest of the journey, the
//! service date and a path calculator. It is built per candidate per query
//! and never cached.
//!
//! [`build_direct`] joins an access template to an egress walk and shifts
//! the result onto the query time. [`build_transfer`] joins an access
//! template to an egress template through a same-stop transfer; that
//! result is left in its as-traversed time frame.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::debug;

use super::path::{FlexPath, FlexPathCalculator};
use super::street::{NearbyStop, State, StepKind, StreetEdge};
use super::trip::FlexTrip;
use crate::domain::{
    FeedScopedId, FlexRide, FlexServiceDate, Itinerary, Stop, StopPosition, TimeFrame, Transfer,
    TransferType, Vertex, instant_at,
};

/// Which end of the journey a template serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateDirection {
    /// The rider walks to the flex pickup, then rides toward the rest of
    /// the journey.
    Access,
    /// The rider rides from the rest of the journey, then walks from the
    /// flex drop-off.
    Egress,
}

/// One flex ride bound to a walk result.
#[derive(Debug, Clone, Copy)]
pub struct AccessEgressTemplate<'a> {
    /// Walk result at the non-transfer end of the ride
    pub nearby: &'a NearbyStop,
    pub trip: &'a FlexTrip,
    pub from_pos: StopPosition,
    pub to_pos: StopPosition,
    /// Stop where the ride meets the rest of the journey
    pub transfer_stop: &'a Stop,
    pub date: FlexServiceDate,
    pub calculator: &'a dyn FlexPathCalculator,
    pub direction: TemplateDirection,
}

impl<'a> AccessEgressTemplate<'a> {
    /// Endpoints of the flex ride when the far end is `flex_vertex`.
    fn flex_endpoints(&self, flex_vertex: &Vertex) -> (Vertex, Vertex) {
        let own = *self.nearby.state.vertex();
        match self.direction {
            TemplateDirection::Access => (own, *flex_vertex),
            TemplateDirection::Egress => (*flex_vertex, own),
        }
    }

    /// Flex path between this template's walk vertex and `flex_vertex`.
    ///
    /// A zero-length hop is not a ride.
    fn flex_path(&self, flex_vertex: &Vertex) -> Option<FlexPath> {
        if self.nearby.state.vertex().id == flex_vertex.id {
            return None;
        }
        let (from, to) = self.flex_endpoints(flex_vertex);
        self.calculator
            .calculate_flex_path(&from, &to, self.from_pos, self.to_pos)
    }

    /// Returns true if a flex ride can connect this template's walk vertex
    /// with `flex_vertex`.
    pub fn is_routeable(&self, flex_vertex: &Vertex) -> bool {
        self.flex_path(flex_vertex).is_some()
    }

    /// Flex edge to (access) or from (egress) `flex_vertex` at `other_stop`.
    fn flex_edge(&self, flex_vertex: &Vertex, other_stop: &Stop) -> Option<FlexTripEdge> {
        let path = self.flex_path(flex_vertex)?;
        let (from, to) = self.flex_endpoints(flex_vertex);
        let (board, alight) = match self.direction {
            TemplateDirection::Access => (&self.nearby.stop.id, &other_stop.id),
            TemplateDirection::Egress => (&other_stop.id, &self.nearby.stop.id),
        };
        Some(FlexTripEdge {
            from,
            to,
            ride: FlexRide {
                trip_id: self.trip.id().clone(),
                from_stop: board.clone(),
                to_stop: alight.clone(),
                from_position: self.from_pos,
                to_position: self.to_pos,
            },
            path,
        })
    }

    /// Splits a traversed state's elapsed time around the flex ride:
    /// `(before boarding, in the vehicle, after alighting)`.
    fn flex_times(&self, flex_edge: &FlexTripEdge, state: &State) -> (i32, i32, i32) {
        let pre_flex = self.nearby.state.elapsed_seconds();
        let flex = flex_edge.path.duration_seconds;
        let post_flex = state.elapsed_seconds() - pre_flex - flex;
        (pre_flex, flex, post_flex)
    }
}

/// The flex ride as a traversable edge.
#[derive(Debug, Clone)]
struct FlexTripEdge {
    from: Vertex,
    to: Vertex,
    ride: FlexRide,
    path: FlexPath,
}

impl StreetEdge for FlexTripEdge {
    fn from_vertex(&self) -> &Vertex {
        &self.from
    }

    fn to_vertex(&self) -> &Vertex {
        &self.to
    }

    fn traverse(&self, state: &State) -> Option<State> {
        if state.vertex().id != self.from.id {
            return None;
        }
        state.advance(
            StepKind::Flex(self.ride.clone()),
            self.to,
            self.path.duration_seconds,
            self.path.distance_meters as f64,
        )
    }
}

/// Zero-distance wait between two flex rides.
#[derive(Debug, Clone)]
struct FlexTransferEdge {
    from: Vertex,
    to: Vertex,
    min_transfer_time_seconds: i32,
}

impl StreetEdge for FlexTransferEdge {
    fn from_vertex(&self) -> &Vertex {
        &self.from
    }

    fn to_vertex(&self) -> &Vertex {
        &self.to
    }

    fn traverse(&self, state: &State) -> Option<State> {
        if state.vertex().id != self.from.id {
            return None;
        }
        state.advance(
            StepKind::Transfer,
            self.to,
            self.min_transfer_time_seconds,
            0.0,
        )
    }
}

/// Traverse `edges` in order, logging the first one that fails.
fn traverse_all(mut state: State, edges: &[std::sync::Arc<dyn StreetEdge>]) -> Option<State> {
    for edge in edges {
        match edge.traverse(&state) {
            Some(next) => state = next,
            None => {
                debug!(edge = ?edge, "state is empty after traversing edge");
                return None;
            }
        }
    }
    Some(state)
}

/// Build a door-to-door itinerary: access walk, the template's flex ride,
/// then the `egress` walk.
///
/// `target` is the requested departure (or, if `arrive_by`, arrival) in
/// seconds since `start_of_time`. A depart-at result never starts before
/// `target`; an arrive-by result never ends after it. Any candidate that
/// cannot honor that returns `None`.
pub fn build_direct(
    template: &AccessEgressTemplate<'_>,
    egress: &NearbyStop,
    arrive_by: bool,
    target: i32,
    start_of_time: NaiveDateTime,
) -> Option<Itinerary> {
    if template.direction != TemplateDirection::Access {
        debug!(trip = %template.trip.id(), "direct itinerary needs an access template");
        return None;
    }

    let flex_to_vertex = *egress.first_vertex();
    let Some(flex_edge) = template.flex_edge(&flex_to_vertex, &egress.stop) else {
        debug!(
            trip = %template.trip.id(),
            to = %flex_to_vertex.id,
            "flex destination not routeable"
        );
        return None;
    };

    let state = flex_edge.traverse(&template.nearby.state)?;
    let state = traverse_all(state, &egress.edges)?;

    let (pre_flex, flex, post_flex) = template.flex_times(&flex_edge, &state);
    let from_start = template.date.seconds_from_start_of_time();
    let trip = template.trip;

    let time_shift = if arrive_by {
        let last_stop_arrival = target.checked_sub(post_flex)?.checked_sub(from_start)?;
        let latest_arrival = trip.latest_arrival_time(
            last_stop_arrival,
            template.from_pos,
            template.to_pos,
            flex,
        )?;

        // Shift from departing at the search time to arriving at it
        let shift = from_start + latest_arrival - flex - pre_flex;
        if shift.checked_add(state.elapsed_seconds())? > target {
            debug!(trip = %trip.id(), "would arrive after the search time");
            return None;
        }
        shift
    } else {
        let first_stop_departure = target.checked_add(pre_flex)?.checked_sub(from_start)?;
        let earliest_departure = trip.earliest_departure_time(
            first_stop_departure,
            template.from_pos,
            template.to_pos,
            flex,
        )?;

        let shift = from_start + earliest_departure - pre_flex;
        if shift < target {
            debug!(trip = %trip.id(), "would depart before the search time");
            return None;
        }
        shift
    };

    let mut itinerary = match state.to_itinerary(start_of_time, TimeFrame::AsTraversed) {
        Ok(itinerary) => itinerary,
        Err(err) => {
            debug!(trip = %trip.id(), error = %err, "could not materialize itinerary");
            return None;
        }
    };
    itinerary.time_shift_to_start_at(instant_at(start_of_time, time_shift));
    Some(itinerary)
}

/// Build an itinerary joining two flex rides through `transfer`: this
/// access template's ride, a transfer at one stop, then `egress_template`'s
/// ride and walk.
///
/// Only same-stop transfers of type minimum-time or guaranteed are
/// supported; anything else returns `None`. Minimum-time transfers wait
/// `min_transfer_time_seconds` between the rides.
///
/// The result is not fitted to either trip's time windows. It is anchored
/// to start at `target` (depart-at) or end at it (arrive-by) and marked
/// [`TimeFrame::AsTraversed`].
pub fn build_transfer(
    template: &AccessEgressTemplate<'_>,
    transfer: &Transfer,
    egress_template: &AccessEgressTemplate<'_>,
    arrive_by: bool,
    target: i32,
    start_of_time: NaiveDateTime,
    stop_vertex_index: &HashMap<FeedScopedId, Vertex>,
) -> Option<Itinerary> {
    if template.direction != TemplateDirection::Access
        || egress_template.direction != TemplateDirection::Egress
    {
        debug!(
            first = %template.trip.id(),
            second = %egress_template.trip.id(),
            "transfer itinerary needs an access then an egress template"
        );
        return None;
    }

    if !transfer.is_same_stop() {
        debug!(from = %transfer.from_stop, to = %transfer.to_stop, "walking transfers are not supported");
        return None;
    }

    let is_min_time = match transfer.transfer_type {
        TransferType::MinTime => true,
        TransferType::Guaranteed => false,
        other => {
            debug!(transfer_type = ?other, "transfer type not supported");
            return None;
        }
    };

    let from_vertex = stop_vertex_index.get(&transfer.from_stop)?;
    let to_vertex = stop_vertex_index.get(&transfer.to_stop)?;

    let first = template.flex_edge(from_vertex, egress_template.transfer_stop)?;
    let second = egress_template.flex_edge(to_vertex, template.transfer_stop)?;

    let mut state = first.traverse(&template.nearby.state)?;

    if is_min_time {
        let wait = FlexTransferEdge {
            from: *from_vertex,
            to: *to_vertex,
            min_transfer_time_seconds: transfer.min_transfer_time_seconds,
        };
        state = wait.traverse(&state)?;
    }

    state = second.traverse(&state)?;
    let state = traverse_all(state, &egress_template.nearby.edges)?;

    let start = if arrive_by {
        target.checked_sub(state.elapsed_seconds())?
    } else {
        target
    };

    state
        .to_itinerary(instant_at(start_of_time, start), TimeFrame::AsTraversed)
        .ok()
}
