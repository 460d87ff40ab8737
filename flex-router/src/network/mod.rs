//! Network loading.
//!
//! A network fixture lists stops, booking rules, trips with their stop-time
//! rows, transfers and fixed-schedule patterns. [`NetworkData::build`]
//! validates it and classifies the flex trips once, giving an immutable
//! [`FlexNetwork`] that searches share by reference.

mod data;
mod error;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{
    BookingRule, DomainError, FeedScopedId, Stop, StopIndex, Transfer, Vertex, VertexId,
};
use crate::flex::{ClassificationSummary, FlexIndex};
use crate::transit::{TripPattern, TripPatternForDates, TripTimes};

pub use data::{NetworkData, PatternDto, ScheduledTripDto, ServiceDayDto, StopTimeDto, TripDto};
pub use error::NetworkError;

impl NetworkData {
    /// Parse a JSON fixture.
    pub fn from_json_str(json: &str) -> Result<Self, NetworkError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON fixture file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, NetworkError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validate the fixture and classify its trips.
    ///
    /// # Errors
    ///
    /// Fails on duplicate stops, unknown stop or booking rule references,
    /// unparseable times and invalid rows. Trips that are well formed but
    /// not flex are skipped, not errors.
    pub fn build(self) -> Result<FlexNetwork, NetworkError> {
        let mut stops = Vec::with_capacity(self.stops.len());
        let mut stop_indices = HashMap::with_capacity(self.stops.len());
        for stop in self.stops {
            if stop_indices.contains_key(&stop.id) {
                return Err(NetworkError::DuplicateStop(stop.id));
            }
            stop_indices.insert(stop.id.clone(), StopIndex(stops.len()));
            stops.push(Arc::new(stop));
        }

        let booking_rules: HashMap<_, _> = self
            .booking_rules
            .into_iter()
            .map(|rule| (rule.id.clone(), rule))
            .collect();

        let lookup = |id: &FeedScopedId, context: &FeedScopedId| {
            stop_indices
                .get(id)
                .map(|index| Arc::clone(&stops[index.0]))
                .ok_or_else(|| NetworkError::domain(context, DomainError::UnknownStop(id.clone())))
        };

        let mut rows = Vec::with_capacity(self.trips.len());
        for trip in &self.trips {
            let mut stop_times = Vec::with_capacity(trip.stop_times.len());
            for dto in &trip.stop_times {
                if let Some(rule) = dto
                    .booking_rule
                    .as_ref()
                    .filter(|rule| !booking_rules.contains_key(*rule))
                {
                    return Err(NetworkError::UnknownBookingRule {
                        trip: trip.id.clone(),
                        rule: rule.clone(),
                    });
                }
                stop_times.push(dto.to_row(lookup(&dto.stop, &trip.id)?, &trip.id)?);
            }
            rows.push((trip.id.clone(), stop_times));
        }
        let flex_index = FlexIndex::build(rows);

        for transfer in &self.transfers {
            lookup(&transfer.from_stop, &transfer.from_stop)?;
            lookup(&transfer.to_stop, &transfer.to_stop)?;
        }

        let mut patterns = Vec::with_capacity(self.patterns.len());
        for dto in &self.patterns {
            let indices = dto
                .stops
                .iter()
                .map(|stop| {
                    stop_indices.get(stop).copied().ok_or_else(|| {
                        NetworkError::domain(&dto.id, DomainError::UnknownStop(stop.clone()))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let pattern = Arc::new(TripPattern::new(dto.id.clone(), indices));

            let mut dates = Vec::with_capacity(dto.services.len());
            for day in &dto.services {
                let trips = day
                    .trips
                    .iter()
                    .map(|trip| {
                        TripTimes::new(trip.trip_id.clone(), &trip.parse_times()?)
                            .map_err(|e| NetworkError::domain(&trip.trip_id, e))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                dates.push((day.date, trips));
            }

            let for_dates = TripPatternForDates::new(pattern, dates)
                .map_err(|e| NetworkError::domain(&dto.id, e))?;
            debug!(pattern = %dto.id, trips = for_dates.trip_count(), "loaded pattern");
            patterns.push(for_dates);
        }

        info!(
            stops = stops.len(),
            booking_rules = booking_rules.len(),
            flex_trips = flex_index.len(),
            transfers = self.transfers.len(),
            patterns = patterns.len(),
            "network built"
        );

        Ok(FlexNetwork {
            stops,
            stop_indices,
            booking_rules,
            flex_index,
            transfers: self.transfers,
            patterns,
        })
    }
}

/// A validated network with its flex trips classified.
///
/// Never mutated after [`NetworkData::build`].
#[derive(Debug, Clone)]
pub struct FlexNetwork {
    stops: Vec<Arc<Stop>>,
    stop_indices: HashMap<FeedScopedId, StopIndex>,
    booking_rules: HashMap<FeedScopedId, BookingRule>,
    flex_index: FlexIndex,
    transfers: Vec<Transfer>,
    patterns: Vec<TripPatternForDates>,
}

impl FlexNetwork {
    /// Load, validate and classify a fixture file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NetworkError> {
        NetworkData::from_path(path)?.build()
    }

    /// All stops, in fixture order.
    pub fn stops(&self) -> &[Arc<Stop>] {
        &self.stops
    }

    pub fn stop(&self, id: &FeedScopedId) -> Option<&Arc<Stop>> {
        self.stop_index(id).and_then(|index| self.stop_at(index))
    }

    pub fn stop_index(&self, id: &FeedScopedId) -> Option<StopIndex> {
        self.stop_indices.get(id).copied()
    }

    pub fn stop_at(&self, index: StopIndex) -> Option<&Arc<Stop>> {
        self.stops.get(index.0)
    }

    pub fn booking_rule(&self, id: &FeedScopedId) -> Option<&BookingRule> {
        self.booking_rules.get(id)
    }

    pub fn flex_index(&self) -> &FlexIndex {
        &self.flex_index
    }

    /// Classification counts from building the flex index.
    pub fn summary(&self) -> ClassificationSummary {
        self.flex_index.summary()
    }

    /// Transfers leaving `stop`. The iterator borrows only the network.
    pub fn transfers_from<'a>(
        &'a self,
        stop: &FeedScopedId,
    ) -> impl Iterator<Item = &'a Transfer> + use<'a> {
        let stop = stop.clone();
        self.transfers.iter().filter(move |t| t.from_stop == stop)
    }

    pub fn patterns(&self) -> &[TripPatternForDates] {
        &self.patterns
    }

    /// A street vertex for each stop, numbered by stop index and placed at
    /// the stop's coordinate.
    pub fn stop_vertices(&self) -> HashMap<FeedScopedId, Vertex> {
        self.stops
            .iter()
            .enumerate()
            .map(|(i, stop)| (stop.id.clone(), Vertex::new(VertexId(i), stop.coordinate())))
            .collect()
    }
}
