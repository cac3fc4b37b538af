//! Error types for index construction, queries and assignment jobs.

use crate::PointId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeoNearError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeoNearError {
    /// Bad `k`, chunk size, radius, query coordinates or configuration.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Point id {id} out of range (store holds {len} points)")]
    OutOfRange { id: PointId, len: usize },

    /// Assignment was requested against a reference set with no points.
    #[error("Reference set is empty")]
    EmptyReferenceSet,

    /// Non-finite or out-of-bounds coordinate. Recorded per record during
    /// ingestion rather than aborting the load.
    #[error("Malformed coordinate: {0}")]
    MalformedCoordinate(String),
}
