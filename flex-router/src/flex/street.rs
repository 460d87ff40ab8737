//! Street-side collaborators of the flex templates.
//!
//! The street network itself lives elsewhere. Here we only need its
//! traversal primitive: a [`StreetEdge`] turns one [`State`] into the next,
//! or fails. A [`NearbyStop`] is the result of a walk search from the
//! rider's origin (access) or to their destination (egress).

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};

use crate::domain::{
    DomainError, FlexRide, Itinerary, Leg, LegKind, Stop, TimeFrame, Vertex, VertexId,
};

/// What a traversed step was.
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    Walk,
    Flex(FlexRide),
    Transfer,
}

/// One traversed edge, with times relative to the start of the search state.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub kind: StepKind,
    pub from: VertexId,
    pub to: VertexId,
    /// Elapsed seconds when the step began
    pub start_seconds: i32,
    pub duration_seconds: i32,
    pub distance_meters: f64,
}

impl Step {
    fn end_seconds(&self) -> i32 {
        self.start_seconds + self.duration_seconds
    }
}

/// A search state: where the rider is, how long it took, and how they got
/// there.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    vertex: Vertex,
    elapsed_seconds: i32,
    steps: Vec<Step>,
}

impl State {
    /// Initial state at `vertex` with nothing traversed.
    pub fn new(vertex: Vertex) -> Self {
        Self {
            vertex,
            elapsed_seconds: 0,
            steps: Vec::new(),
        }
    }

    /// Returns the current vertex.
    pub fn vertex(&self) -> &Vertex {
        &self.vertex
    }

    /// Returns seconds elapsed since the initial state.
    pub fn elapsed_seconds(&self) -> i32 {
        self.elapsed_seconds
    }

    /// Returns the traversed steps in order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns the state after moving to `to`.
    ///
    /// Fails if the duration is negative or the elapsed time overflows.
    pub fn advance(
        &self,
        kind: StepKind,
        to: Vertex,
        duration_seconds: i32,
        distance_meters: f64,
    ) -> Option<State> {
        if duration_seconds < 0 {
            return None;
        }
        let elapsed_seconds = self.elapsed_seconds.checked_add(duration_seconds)?;

        let mut steps = self.steps.clone();
        steps.push(Step {
            kind,
            from: self.vertex.id,
            to: to.id,
            start_seconds: self.elapsed_seconds,
            duration_seconds,
            distance_meters,
        });

        Some(State {
            vertex: to,
            elapsed_seconds,
            steps,
        })
    }

    /// Materialize the traversed steps as an itinerary.
    ///
    /// Elapsed second zero is placed at `anchor`. Consecutive walk steps
    /// are merged into one walk leg.
    ///
    /// # Errors
    ///
    /// Returns `Err` if nothing has been traversed.
    pub fn to_itinerary(
        &self,
        anchor: NaiveDateTime,
        frame: TimeFrame,
    ) -> Result<Itinerary, DomainError> {
        let at = |seconds: i32| anchor + Duration::seconds(seconds as i64);
        let mut legs: Vec<Leg> = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            if matches!(step.kind, StepKind::Walk) {
                if let Some(last) = legs.last_mut().filter(|l| l.is_walk()) {
                    last.to = step.to;
                    last.end = at(step.end_seconds());
                    last.distance_meters += step.distance_meters;
                    continue;
                }
            }

            let kind = match &step.kind {
                StepKind::Walk => LegKind::Walk,
                StepKind::Flex(ride) => LegKind::Flex(ride.clone()),
                StepKind::Transfer => LegKind::Transfer,
            };
            legs.push(Leg {
                kind,
                from: step.from,
                to: step.to,
                start: at(step.start_seconds),
                end: at(step.end_seconds()),
                distance_meters: step.distance_meters,
            });
        }

        Itinerary::new(legs, frame)
    }
}

/// A traversable street edge.
pub trait StreetEdge: fmt::Debug + Send + Sync {
    fn from_vertex(&self) -> &Vertex;

    fn to_vertex(&self) -> &Vertex;

    /// Traverse this edge from `state`, or `None` if it cannot be traversed.
    fn traverse(&self, state: &State) -> Option<State>;
}

/// A walkable street segment with a fixed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkEdge {
    pub from: Vertex,
    pub to: Vertex,
    pub distance_meters: f64,
    pub duration_seconds: i32,
}

impl WalkEdge {
    pub fn new(from: Vertex, to: Vertex, distance_meters: f64, duration_seconds: i32) -> Self {
        Self {
            from,
            to,
            distance_meters,
            duration_seconds,
        }
    }
}

impl StreetEdge for WalkEdge {
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
            StepKind::Walk,
            self.to,
            self.duration_seconds,
            self.distance_meters,
        )
    }
}

/// A stop found by a walk search, with the walk that reaches it.
///
/// For access, `state` is the rider standing at the stop after walking
/// from their origin. For egress, `state` is at the stop and `edges` lead
/// on to the destination.
#[derive(Debug, Clone)]
pub struct NearbyStop {
    pub stop: Arc<Stop>,
    pub distance_meters: f64,
    pub edges: Vec<Arc<dyn StreetEdge>>,
    pub state: State,
}

impl NearbyStop {
    /// Access result: walk `edges` from `origin` to reach `stop`.
    ///
    /// Returns `None` if the walk cannot be traversed.
    pub fn access(stop: Arc<Stop>, origin: Vertex, edges: Vec<Arc<dyn StreetEdge>>) -> Option<Self> {
        let mut state = State::new(origin);
        for edge in &edges {
            state = edge.traverse(&state)?;
        }
        let distance_meters = state.steps().iter().map(|s| s.distance_meters).sum();
        Some(Self {
            stop,
            distance_meters,
            edges,
            state,
        })
    }

    /// Egress result: from `stop_vertex`, walk `edges` to the destination.
    pub fn egress(stop: Arc<Stop>, stop_vertex: Vertex, edges: Vec<Arc<dyn StreetEdge>>) -> Self {
        Self {
            stop,
            distance_meters: 0.0,
            edges,
            state: State::new(stop_vertex),
        }
    }

    /// Vertex at which the walk toward the destination begins.
    pub fn first_vertex(&self) -> &Vertex {
        self.edges
            .first()
            .map(|e| e.from_vertex())
            .unwrap_or(self.state.vertex())
    }
}
