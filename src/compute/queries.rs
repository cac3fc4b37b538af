//! Kilometer-based radius and nearest-neighbor queries over a point store.

use crate::compute::spatial::algorithms::{degree_radius, haversine_km};
use crate::compute::spatial::kdtree::SpatialIndex;
use crate::compute::validation::{validate_k, validate_query_point};
use crate::config::Config;
use crate::error::Result;
use crate::store::PointStore;
use geonear_types::PointId;
use geonear_types::assignment::Neighbor;
use geonear_types::geo::GeoPoint;
use std::time::Instant;

/// Owns a point store together with the index built over it.
///
/// Taking the store by value guarantees that no point can be added after
/// the index snapshot was taken.
///
/// # Examples
///
/// ```rust
/// use geonear::{GeoPoint, PointStore, QueryEngine};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = PointStore::new();
/// store.load([(-23.5505, -46.6333), (-23.5600, -46.6400), (-23.9000, -46.9000)])?;
/// let engine = QueryEngine::new(store);
///
/// // Points within roughly 5 km of the city centre
/// let hits = engine.spatial_query(&GeoPoint::new(-23.5505, -46.6333), 5.0)?;
/// assert_eq!(hits, vec![0, 1]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: PointStore,
    index: SpatialIndex,
}

impl QueryEngine {
    /// Build the index with default settings.
    pub fn new(store: PointStore) -> Self {
        Self::with_config(store, &Config::default())
    }

    pub fn with_config(store: PointStore, config: &Config) -> Self {
        let start = Instant::now();
        let index = SpatialIndex::build_with(store.points(), &config.index);
        log::info!(
            "Built spatial index over {} points (depth {}) in {:.2?}",
            index.len(),
            index.depth(),
            start.elapsed()
        );
        Self { store, index }
    }

    /// Ids of points within `radius_km` of `center`, sorted by id.
    ///
    /// The radius is converted to degrees with
    /// [`degree_radius`](crate::compute::spatial::degree_radius), which
    /// over-selects relative to a true geodesic circle. Use
    /// [`spatial_query_exact`](Self::spatial_query_exact) when exact
    /// membership matters.
    pub fn spatial_query(&self, center: &GeoPoint, radius_km: f64) -> Result<Vec<PointId>> {
        let radius_deg = degree_radius(center, radius_km)?;
        self.index.range_query(center, radius_deg)
    }

    /// Like [`spatial_query`](Self::spatial_query), then keeps only points
    /// whose haversine distance to `center` is within `radius_km`.
    pub fn spatial_query_exact(&self, center: &GeoPoint, radius_km: f64) -> Result<Vec<PointId>> {
        let candidates = self.spatial_query(center, radius_km)?;
        let points = self.store.points();

        Ok(candidates
            .into_iter()
            .filter(|&id| haversine_km(center, &points[id]) <= radius_km)
            .collect())
    }

    /// One ranked neighbor list per query point, ascending by degree
    /// distance with ties broken by id.
    pub fn nearest(&self, query_points: &[GeoPoint], k: usize) -> Result<Vec<Vec<Neighbor>>> {
        validate_k(k)?;
        for point in query_points {
            validate_query_point(point)?;
        }

        query_points
            .iter()
            .map(|point| self.index.k_nearest(point, k))
            .collect()
    }

    pub fn get(&self, id: PointId) -> Result<GeoPoint> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn store(&self) -> &PointStore {
        &self.store
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }
}
