use crate::PointId;
use serde::{Deserialize, Serialize};

/// One entry of a ranked nearest-neighbor list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Identity of the indexed point
    pub id: PointId,
    /// Euclidean distance in degrees from the query point
    pub distance: f64,
}

impl Neighbor {
    pub fn new(id: PointId, distance: f64) -> Self {
        Self { id, distance }
    }
}

/// Nearest reference point for a single subject point.
///
/// `subject_id` is the subject's position in the input sequence, so chunk
/// boundaries are never visible in the output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub subject_id: PointId,
    pub reference_id: PointId,
    /// Euclidean distance in degree space (the metric the index ranks by)
    pub distance_deg: f64,
    /// Haversine distance in meters between the two points
    pub distance_m: f64,
}
