//! Append-only point store with dense insertion-order identities.

use crate::compute::validation::{classify_coordinate, validate_bounds};
use crate::config::Config;
use crate::error::{GeoNearError, Result};
use geonear_types::PointId;
use geonear_types::bbox::BoundingBox2D;
use geonear_types::geo::GeoPoint;
use geonear_types::stats::{LoadReport, Rejection};
use std::time::Instant;

/// Canonical ordered sequence of ingested points.
///
/// A point's identity is its position in the store. The store is filled by
/// [`PointStore::load`] and is read-only once handed to an index.
///
/// # Examples
///
/// ```rust
/// use geonear::PointStore;
///
/// let mut store = PointStore::new();
/// let report = store.load([(-23.55, -46.63), (f64::NAN, 0.0), (95.0, 0.0)])?;
///
/// assert_eq!(report.accepted, 1);
/// assert_eq!(report.rejected_non_finite, 1);
/// assert_eq!(report.rejected_out_of_bounds, 1);
/// assert_eq!(store.get(0)?.lat(), -23.55);
/// # Ok::<(), geonear::GeoNearError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PointStore {
    points: Vec<GeoPoint>,
    bounds: BoundingBox2D,
}

impl PointStore {
    /// Empty store accepting any valid latitude/longitude.
    pub fn new() -> Self {
        Self::with_bounds(BoundingBox2D::world())
    }

    /// Empty store accepting only points inside `bounds`.
    pub fn with_bounds(bounds: BoundingBox2D) -> Self {
        Self {
            points: Vec::new(),
            bounds,
        }
    }

    /// Empty store accepting only points inside `config.bounds`.
    pub fn with_config(config: &Config) -> Self {
        Self::with_bounds(config.bounds)
    }

    /// Replace the contents with `coordinates`, given as `(lat, lon)` pairs.
    ///
    /// Records with a non-finite coordinate or lying outside the configured
    /// bounds are not stored; each is flagged in the returned report and
    /// ingestion carries on. Accepted points get consecutive identities
    /// starting at 0.
    pub fn load<I>(&mut self, coordinates: I) -> Result<LoadReport>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        validate_bounds(&self.bounds)?;

        let start = Instant::now();
        let iter = coordinates.into_iter();
        let mut points = Vec::with_capacity(iter.size_hint().0);
        let mut report = LoadReport::new();

        for (position, (lat, lon)) in iter.enumerate() {
            let point = GeoPoint::new(lat, lon);
            match classify_coordinate(&point, &self.bounds) {
                Ok(()) => points.push(point),
                Err((kind, err)) => {
                    log::debug!("Rejected record {}: {}", position, err);
                    report.record_rejection(Rejection {
                        position,
                        kind,
                        message: err.to_string(),
                    });
                }
            }
        }

        report.accepted = points.len();
        self.points = points;

        log::info!(
            "Loaded {} points ({} non-finite, {} out of bounds rejected) in {:.2?}",
            report.accepted,
            report.rejected_non_finite,
            report.rejected_out_of_bounds,
            start.elapsed()
        );

        Ok(report)
    }

    /// Point with identity `id`.
    pub fn get(&self, id: PointId) -> Result<GeoPoint> {
        self.points
            .get(id)
            .copied()
            .ok_or(GeoNearError::OutOfRange {
                id,
                len: self.points.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in identity order.
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = (PointId, GeoPoint)> + '_ {
        self.points.iter().copied().enumerate()
    }

    pub fn bounds(&self) -> &BoundingBox2D {
        &self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geonear_types::stats::RejectionKind;

    #[test]
    fn test_load_assigns_dense_ids() {
        let mut store = PointStore::new();
        let report = store
            .load([(0.0, 0.0), (f64::NAN, 1.0), (2.0, 2.0), (3.0, 3.0)])
            .unwrap();

        assert_eq!(report.accepted, 3);
        assert_eq!(report.rejected(), 1);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(1).unwrap(), GeoPoint::new(2.0, 2.0));
        assert_eq!(store.get(2).unwrap(), GeoPoint::new(3.0, 3.0));

        let ids: Vec<PointId> = store.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_load_flags_out_of_bounds() {
        let mut store = PointStore::with_bounds(BoundingBox2D::sao_paulo());
        let report = store
            .load([
                (-23.5505, -46.6333),
                (40.7128, -74.0060),
                (-23.9, -46.1),
                (f64::INFINITY, -46.5),
            ])
            .unwrap();

        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected_out_of_bounds, 1);
        assert_eq!(report.rejected_non_finite, 1);
        assert_eq!(report.rejections[0].position, 1);
        assert_eq!(report.rejections[0].kind, RejectionKind::OutOfBounds);
        assert_eq!(report.rejections[1].position, 3);
        assert_eq!(report.rejections[1].kind, RejectionKind::NonFinite);
        assert!(report.rejections[0].message.contains("outside bounds"));
    }

    #[test]
    fn test_with_config_applies_bounds() {
        let config = Config::default().with_bounds(BoundingBox2D::sao_paulo());
        let mut store = PointStore::with_config(&config);
        assert_eq!(store.bounds(), &BoundingBox2D::sao_paulo());

        let report = store
            .load([(-23.5505, -46.6333), (51.5074, -0.1278)])
            .unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected_out_of_bounds, 1);

        let mut open = PointStore::with_config(&Config::default());
        assert_eq!(open.load([(51.5074, -0.1278)]).unwrap().accepted, 1);
    }

    #[test]
    fn test_load_replaces_contents() {
        let mut store = PointStore::new();
        store.load([(1.0, 1.0), (2.0, 2.0)]).unwrap();
        store.load([(5.0, 5.0)]).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap(), GeoPoint::new(5.0, 5.0));
    }

    #[test]
    fn test_get_out_of_range() {
        let mut store = PointStore::new();
        store.load([(1.0, 1.0)]).unwrap();

        let err = store.get(1).unwrap_err();
        assert_eq!(err, GeoNearError::OutOfRange { id: 1, len: 1 });
        assert!(PointStore::new().get(0).is_err());
    }

    #[test]
    fn test_load_rejects_invalid_bounds() {
        let mut store = PointStore::with_bounds(BoundingBox2D::new(f64::NAN, 0.0, 1.0, 1.0));
        let err = store.load([(0.5, 0.5)]).unwrap_err();
        assert!(matches!(err, GeoNearError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_load() {
        let mut store = PointStore::new();
        let report = store.load(std::iter::empty()).unwrap();
        assert!(store.is_empty());
        assert_eq!(report.total(), 0);
        assert!(report.is_clean());
    }
}
