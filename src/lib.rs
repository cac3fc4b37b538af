//! Static 2D point indexing with kilometer radius queries, k-nearest
//! neighbors and chunked nearest-reference assignment.
//!
//! ```rust
//! use geonear::{AssignmentEngine, GeoPoint, PointStore, QueryEngine};
//!
//! let mut incidents = PointStore::new();
//! incidents.load([(-23.5505, -46.6333), (-23.5614, -46.6559)])?;
//! let engine = QueryEngine::new(incidents.clone());
//!
//! let nearby = engine.spatial_query(&GeoPoint::new(-23.55, -46.63), 1.0)?;
//! assert_eq!(nearby, vec![0]);
//!
//! let mut junctions = PointStore::new();
//! junctions.load([(-23.5500, -46.6300), (-23.5600, -46.6600)])?;
//! let assigner = AssignmentEngine::new(junctions)?;
//! let result = assigner.assign(incidents.points(), assigner.default_options())?;
//! assert_eq!(result.records[1].reference_id, 1);
//! # Ok::<(), geonear::GeoNearError>(())
//! ```

pub mod batch;
pub mod builder;
pub mod compute;
pub mod config;
pub mod error;
pub mod store;

pub use builder::IndexBuilder;
pub use error::{GeoNearError, Result};

pub use geonear_types::PointId;

pub use config::{
    AssignmentRecord, AssignmentSummary, BoundingBox2D, Config, GeoPoint, IndexConfig, LoadReport,
    Neighbor, Rejection, RejectionKind, SplitStrategy,
};

pub use compute::QueryEngine;
pub use compute::spatial::{KM_PER_DEGREE, SpatialIndex, degree_radius};

pub use store::PointStore;

pub use batch::{
    AssignOptions, AssignProgress, AssignmentEngine, AssignmentResult, CancellationToken,
    assign_nearest,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeoNearError, IndexBuilder, Result};

    pub use crate::{BoundingBox2D, GeoPoint, Neighbor, PointId};

    pub use crate::{Config, IndexConfig, SplitStrategy};

    pub use crate::{PointStore, QueryEngine, SpatialIndex};

    pub use crate::{AssignOptions, AssignmentEngine, CancellationToken, assign_nearest};
}
