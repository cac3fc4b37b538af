//! Configuration for ingestion, index construction and assignment jobs.
//!
//! This module provides configuration types and re-exports the shared data
//! types from the `geonear-types` crate for convenience.
use serde::de::Error;

pub use geonear_types::assignment::{AssignmentRecord, Neighbor};
pub use geonear_types::bbox::BoundingBox2D;
pub use geonear_types::geo::GeoPoint;
pub use geonear_types::stats::{AssignmentSummary, LoadReport, Rejection, RejectionKind};

/// How a k-d tree node picks the axis it splits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Axis with the greatest coordinate spread among the node's points
    #[default]
    Spread,
    /// Latitude at even depths, longitude at odd depths
    Alternate,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Subject points processed per chunk by the assignment engine
    #[serde(default = "Config::default_chunk_size")]
    pub chunk_size: usize,

    /// Acceptance region for ingested coordinates
    #[serde(default)]
    pub bounds: BoundingBox2D,

    #[serde(default)]
    pub index: IndexConfig,
}

/// Settings for building a spatial index
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Maximum number of points kept in a leaf node
    #[serde(default = "IndexConfig::default_leaf_size")]
    pub leaf_size: usize,

    #[serde(default)]
    pub split_strategy: SplitStrategy,
}

impl IndexConfig {
    const fn default_leaf_size() -> usize {
        16
    }

    /// Maximum points per leaf. Zero is treated as one.
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        if leaf_size == 0 {
            log::warn!("Leaf size 0 is not allowed, using 1");
        }
        self.leaf_size = leaf_size.max(1);
        self
    }

    pub fn with_split_strategy(mut self, strategy: SplitStrategy) -> Self {
        self.split_strategy = strategy;
        self
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            leaf_size: Self::default_leaf_size(),
            split_strategy: SplitStrategy::default(),
        }
    }
}

impl Config {
    const fn default_chunk_size() -> usize {
        10_000
    }

    pub fn with_bounds(mut self, bounds: BoundingBox2D) -> Self {
        self.bounds = bounds;
        self
    }

    /// Subjects per assignment chunk. Zero is treated as one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        if chunk_size == 0 {
            log::warn!("Chunk size 0 is not allowed, using 1");
        } else if chunk_size > 1_000_000 {
            log::warn!(
                "Chunk size of {} is very large; peak memory grows linearly with it",
                chunk_size
            );
        }

        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_index(mut self, index: IndexConfig) -> Self {
        self.index = index;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("Chunk size must be greater than zero".to_string());
        }

        if self.index.leaf_size == 0 {
            return Err("Leaf size must be greater than zero".to_string());
        }

        crate::compute::validation::validate_bounds(&self.bounds).map_err(|e| e.to_string())?;

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: Self::default_chunk_size(),
            bounds: BoundingBox2D::default(),
            index: IndexConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.chunk_size, 10_000);
        assert_eq!(config.bounds, BoundingBox2D::world());
        assert_eq!(config.index.leaf_size, 16);
        assert_eq!(config.index.split_strategy, SplitStrategy::Spread);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default()
            .with_bounds(BoundingBox2D::sao_paulo())
            .with_chunk_size(500)
            .with_index(
                IndexConfig::default()
                    .with_leaf_size(4)
                    .with_split_strategy(SplitStrategy::Alternate),
            );

        let json = config.to_json().unwrap();
        let deserialized = Config::from_json(&json).unwrap();

        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{ "chunk_size": 250 }"#).unwrap();
        assert_eq!(config.chunk_size, 250);
        assert_eq!(config.index, IndexConfig::default());
        assert_eq!(config.bounds, BoundingBox2D::world());
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        assert!(Config::from_json(r#"{ "chunksize": 250 }"#).is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());

        let zero_chunk = Config::from_json(r#"{ "chunk_size": 0 }"#);
        assert!(zero_chunk.is_err());

        let zero_leaf = Config::from_json(r#"{ "index": { "leaf_size": 0 } }"#);
        assert!(zero_leaf.is_err());
    }

    #[test]
    fn test_builder_methods_clamp_zero() {
        let config = Config::default()
            .with_chunk_size(0)
            .with_index(IndexConfig::default().with_leaf_size(0));
        assert_eq!(config.chunk_size, 1);
        assert_eq!(config.index.leaf_size, 1);
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_config_toml_roundtrip() {
        let config = Config::default().with_chunk_size(1234);
        let text = config.to_toml().unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.chunk_size, 1234);
    }
}
