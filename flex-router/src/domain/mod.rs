//! Domain types for the flex router.
//!
//! This module contains the core model: stops, stop-time rows, service-day
//! time, positions within a trip and itineraries. Types enforce their
//! invariants at construction time, so code that receives them can trust
//! their validity.

mod booking;
mod error;
mod id;
mod itinerary;
mod position;
mod stop;
mod stop_time;
mod time;
mod transfer;
mod vertex;

pub use booking::{BookingRule, BookingType};
pub use error::DomainError;
pub use id::{FeedScopedId, InvalidFeedScopedId};
pub use itinerary::{FlexRide, Itinerary, Leg, LegKind, TimeFrame};
pub use position::StopPosition;
pub use stop::{Coordinate, Stop, StopIndex, StopLocation};
pub use stop_time::{FlexWindow, PickDrop, StopTimeWindow};
pub use time::{
    FlexServiceDate, SECONDS_PER_DAY, TimeError, format_service_time, instant_at,
    parse_service_time,
};
pub use transfer::{Transfer, TransferType};
pub use vertex::{Vertex, VertexId};
