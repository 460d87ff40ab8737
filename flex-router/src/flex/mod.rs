//! Flexible-trip routing.
//!
//! Demand-responsive trips are classified once into one of three variants
//! ([`classify`], [`FlexIndex`]), answer earliest-departure and
//! latest-arrival queries ([`FlexTrip`]), and are joined to the rider's
//! walk legs by access/egress templates ([`build_direct`],
//! [`build_transfer`]) using a [`FlexPathCalculator`] for ride durations.

mod cache;
mod classify;
mod path;
mod street;
mod template;
mod trip;

pub use cache::{CachedPathCalculator, DEFAULT_PATH_CACHE_CAPACITY};
pub use classify::{ClassificationSummary, FlexIndex, classify, detect_kind};
pub use path::{
    ContinuousStopsPathCalculator, DirectPathCalculator, FlexPath, FlexPathCalculator,
    StreetNetwork, StreetPathCalculator,
};
pub use street::{NearbyStop, State, Step, StepKind, StreetEdge, WalkEdge};
pub use template::{AccessEgressTemplate, TemplateDirection, build_direct, build_transfer};
pub use trip::{
    ContinuousPickupDropOffTrip, FlexTrip, FlexTripKind, ScheduledDeviatedTrip, UnscheduledTrip,
};
