//! # geonear-types
//!
//! Core data types shared by the geonear spatial index and assignment engine.
//!
//! - **Point types**: `GeoPoint` (latitude/longitude pair)
//! - **Bounding box types**: `BoundingBox2D`
//! - **Result types**: `Neighbor`, `AssignmentRecord`, `LoadReport`, `AssignmentSummary`
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use geonear_types::bbox::BoundingBox2D;
//! use geonear_types::geo::GeoPoint;
//!
//! let centro = GeoPoint::new(-23.5505, -46.6333);
//! let sao_paulo = BoundingBox2D::sao_paulo();
//! assert!(sao_paulo.contains_point(&centro));
//! ```

pub mod assignment;
pub mod bbox;
pub mod geo;
pub mod stats;

/// Stable identity of a point: its 0-based insertion position in a point store.
pub type PointId = usize;
