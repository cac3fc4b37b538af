//! Builder for spatial indexes
//!
//! Collects leaf size and split strategy before building a [`SpatialIndex`]
//! over a slice of points or a loaded [`PointStore`].

use crate::compute::spatial::kdtree::SpatialIndex;
use crate::config::{IndexConfig, SplitStrategy};
use crate::store::PointStore;
use geonear_types::geo::GeoPoint;
use std::time::Instant;

/// Builder for index construction settings.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    config: IndexConfig,
}

impl IndexBuilder {
    /// Create a builder with the default leaf size and split strategy.
    pub fn new() -> Self {
        Self {
            config: IndexConfig::default(),
        }
    }

    pub fn from_config(config: &IndexConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Maximum points per leaf. Zero is treated as one.
    pub fn leaf_size(mut self, leaf_size: usize) -> Self {
        self.config = self.config.with_leaf_size(leaf_size);
        self
    }

    pub fn split_strategy(mut self, strategy: SplitStrategy) -> Self {
        self.config.split_strategy = strategy;
        self
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Build over `points`; ids are slice positions.
    pub fn build(&self, points: &[GeoPoint]) -> SpatialIndex {
        let start = Instant::now();
        let index = SpatialIndex::build_with(points, &self.config);
        log::debug!(
            "Built index over {} points (leaf size {}, {:?}) in {:.2?}",
            index.len(),
            self.config.leaf_size,
            self.config.split_strategy,
            start.elapsed()
        );
        index
    }

    pub fn build_from_store(&self, store: &PointStore) -> SpatialIndex {
        self.build(store.points())
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}
