//! Serialized network fixture.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::NetworkError;
use crate::domain::{
    BookingRule, DomainError, FeedScopedId, FlexWindow, PickDrop, Stop, StopTimeWindow, Transfer,
    parse_service_time,
};

/// A whole network as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkData {
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub booking_rules: Vec<BookingRule>,
    #[serde(default)]
    pub trips: Vec<TripDto>,
    #[serde(default)]
    pub transfers: Vec<Transfer>,
    /// Fixed-schedule patterns
    #[serde(default)]
    pub patterns: Vec<PatternDto>,
}

/// A trip and its stop-time rows, in trip order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDto {
    pub id: FeedScopedId,
    #[serde(default)]
    pub stop_times: Vec<StopTimeDto>,
}

fn not_available() -> PickDrop {
    PickDrop::NotAvailable
}

/// One stop-time row. Times are `HH:MM:SS` service times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTimeDto {
    pub stop: FeedScopedId,
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub start_pickup_drop_off_window: Option<String>,
    #[serde(default)]
    pub end_pickup_drop_off_window: Option<String>,
    #[serde(default)]
    pub pickup_type: PickDrop,
    #[serde(default)]
    pub drop_off_type: PickDrop,
    #[serde(default = "not_available")]
    pub continuous_pickup: PickDrop,
    #[serde(default = "not_available")]
    pub continuous_drop_off: PickDrop,
    #[serde(default)]
    pub booking_rule: Option<FeedScopedId>,
}

impl StopTimeDto {
    /// Convert to a validated row at `stop`. `trip` names the row in errors.
    pub(crate) fn to_row(
        &self,
        stop: Arc<Stop>,
        trip: &FeedScopedId,
    ) -> Result<StopTimeWindow, NetworkError> {
        let time = |s: &Option<String>| {
            s.as_deref()
                .map(parse_service_time)
                .transpose()
                .map_err(|e| NetworkError::time(trip, e))
        };

        let arrival = time(&self.arrival_time)?;
        let departure = time(&self.departure_time)?;
        if matches!((arrival, departure), (Some(arr), Some(dep)) if dep < arr) {
            return Err(NetworkError::domain(
                trip,
                DomainError::InvalidStopTime("departure must not be before arrival"),
            ));
        }

        let window = match (
            time(&self.start_pickup_drop_off_window)?,
            time(&self.end_pickup_drop_off_window)?,
        ) {
            (Some(start), Some(end)) => {
                Some(FlexWindow::new(start, end).map_err(|e| NetworkError::domain(trip, e))?)
            }
            (None, None) => None,
            _ => {
                return Err(NetworkError::domain(
                    trip,
                    DomainError::InvalidStopTime("flex window needs both start and end"),
                ));
            }
        };

        Ok(StopTimeWindow {
            stop,
            arrival,
            departure,
            window,
            pickup: self.pickup_type,
            drop_off: self.drop_off_type,
            continuous_pickup: self.continuous_pickup,
            continuous_drop_off: self.continuous_drop_off,
            booking_rule: self.booking_rule.clone(),
        })
    }
}

/// A fixed-schedule pattern with the trips it runs per service date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternDto {
    pub id: FeedScopedId,
    pub stops: Vec<FeedScopedId>,
    #[serde(default)]
    pub services: Vec<ServiceDayDto>,
}

/// The trips a pattern runs on one service date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDayDto {
    pub date: NaiveDate,
    pub trips: Vec<ScheduledTripDto>,
}

/// Arrival and departure at each stop of the pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTripDto {
    pub trip_id: FeedScopedId,
    /// `[arrival, departure]` per stop, as `HH:MM:SS`
    pub times: Vec<(String, String)>,
}

impl ScheduledTripDto {
    pub(crate) fn parse_times(&self) -> Result<Vec<(i32, i32)>, NetworkError> {
        self.times
            .iter()
            .map(|(arr, dep)| {
                let arr = parse_service_time(arr).map_err(|e| NetworkError::time(&self.trip_id, e))?;
                let dep = parse_service_time(dep).map_err(|e| NetworkError::time(&self.trip_id, e))?;
                Ok((arr, dep))
            })
            .collect()
    }
}
