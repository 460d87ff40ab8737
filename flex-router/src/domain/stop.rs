//! Stop types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::FeedScopedId;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Mean earth radius used for great-circle distances.
    const EARTH_RADIUS_METERS: f64 = 6_371_010.0;

    /// Creates a new coordinate.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to `other` in meters.
    ///
    /// # Examples
    ///
    /// ```
    /// use flex_router::domain::Coordinate;
    ///
    /// let a = Coordinate::new(59.91, 10.75);
    /// assert_eq!(a.distance_meters(&a), 0.0);
    ///
    /// // One degree of latitude is roughly 111 km
    /// let b = Coordinate::new(60.91, 10.75);
    /// let d = a.distance_meters(&b);
    /// assert!((d - 111_195.0).abs() < 100.0);
    /// ```
    pub fn distance_meters(&self, other: &Coordinate) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * Self::EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

/// Where a stop is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StopLocation {
    /// A discrete boarding point.
    Point { coordinate: Coordinate },
    /// A continuous-service area; riders may board anywhere inside it.
    Area { centroid: Coordinate },
}

/// A stop: a discrete point or a continuous-service area.
///
/// Stops are built once while preparing the network and shared by
/// reference (`Arc<Stop>`) with every trip that calls at them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Unique stop identifier
    pub id: FeedScopedId,
    /// Display name
    pub name: String,
    /// Point or area
    pub location: StopLocation,
}

impl Stop {
    /// Creates a point stop.
    pub fn point(id: FeedScopedId, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id,
            name: name.into(),
            location: StopLocation::Point { coordinate },
        }
    }

    /// Creates an area stop.
    pub fn area(id: FeedScopedId, name: impl Into<String>, centroid: Coordinate) -> Self {
        Self {
            id,
            name: name.into(),
            location: StopLocation::Area { centroid },
        }
    }

    /// Returns the stop's representative coordinate.
    pub fn coordinate(&self) -> Coordinate {
        match self.location {
            StopLocation::Point { coordinate } => coordinate,
            StopLocation::Area { centroid } => centroid,
        }
    }

    /// Returns true if this stop is a continuous-service area.
    pub fn is_area(&self) -> bool {
        matches!(self.location, StopLocation::Area { .. })
    }
}

/// Index of a stop in the network's stop table.
///
/// Trip patterns refer to stops by index so that offset schedules can be
/// compared without touching the stop data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StopIndex(pub usize);

impl fmt::Display for StopIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for StopIndex {
    fn from(value: usize) -> Self {
        StopIndex(value)
    }
}
