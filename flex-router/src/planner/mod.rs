//! Flex itinerary planning.
//!
//! Drives the flex templates over a range of target times, then merges,
//! ranks and truncates the results:
//! "Given these walk-to-flex options, which itineraries should the rider see?"

mod config;
mod filter;
mod rank;
mod router;

#[cfg(test)]
mod router_tests;

pub use config::{ConfigError, RoutingConfig};
pub use filter::{DropSubscriber, FilterChain, ItineraryFilter, MaxLimitFilter};
pub use rank::{deduplicate, rank_itineraries};
pub use router::{
    DirectCandidate, FlexAccessEgress, FlexQuery, FlexRouter, FlexSearchResult, RouterError,
    TransferCandidate,
};
