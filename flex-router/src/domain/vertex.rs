//! Street-network vertex handles.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Opaque identifier of a vertex in the street network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub usize);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A street vertex with its location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub coordinate: Coordinate,
}

impl Vertex {
    /// Creates a vertex.
    pub fn new(id: VertexId, coordinate: Coordinate) -> Self {
        Self { id, coordinate }
    }
}
