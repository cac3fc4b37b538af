//! Validation for geographic coordinates and query arguments.

use crate::error::{GeoNearError, Result};
use geonear_types::bbox::BoundingBox2D;
use geonear_types::geo::GeoPoint;
use geonear_types::stats::RejectionKind;

/// Classifies a raw ingested coordinate against the acceptance box.
///
/// Returns the rejection kind together with a `MalformedCoordinate` error
/// describing the problem, or `Ok(())` when the point may be stored.
///
/// # Examples
///
/// ```
/// use geonear::compute::validation::classify_coordinate;
/// use geonear::{BoundingBox2D, GeoPoint};
///
/// let bounds = BoundingBox2D::sao_paulo();
/// assert!(classify_coordinate(&GeoPoint::new(-23.55, -46.63), &bounds).is_ok());
/// assert!(classify_coordinate(&GeoPoint::new(40.7, -74.0), &bounds).is_err());
/// assert!(classify_coordinate(&GeoPoint::new(f64::NAN, -46.63), &bounds).is_err());
/// ```
pub fn classify_coordinate(
    point: &GeoPoint,
    bounds: &BoundingBox2D,
) -> std::result::Result<(), (RejectionKind, GeoNearError)> {
    let (lat, lon) = (point.lat(), point.lon());

    if !lat.is_finite() {
        return Err((
            RejectionKind::NonFinite,
            GeoNearError::MalformedCoordinate(format!("Latitude must be finite, got: {}", lat)),
        ));
    }

    if !lon.is_finite() {
        return Err((
            RejectionKind::NonFinite,
            GeoNearError::MalformedCoordinate(format!("Longitude must be finite, got: {}", lon)),
        ));
    }

    if !bounds.contains_point(point) {
        return Err((
            RejectionKind::OutOfBounds,
            GeoNearError::MalformedCoordinate(format!(
                "({}, {}) outside bounds lat [{}, {}], lon [{}, {}]",
                lat,
                lon,
                bounds.min_lat(),
                bounds.max_lat(),
                bounds.min_lon(),
                bounds.max_lon()
            )),
        ));
    }

    Ok(())
}

/// Validates that a bounding box can be used as an acceptance region.
pub fn validate_bounds(bounds: &BoundingBox2D) -> Result<()> {
    if !bounds.is_finite() {
        return Err(GeoNearError::InvalidArgument(format!(
            "Bounding box edges must be finite: {:?}",
            bounds.rect
        )));
    }

    if bounds.min_lat() < -90.0 || bounds.max_lat() > 90.0 {
        return Err(GeoNearError::InvalidArgument(format!(
            "Bounding box latitude out of range [-90.0, 90.0]: [{}, {}]",
            bounds.min_lat(),
            bounds.max_lat()
        )));
    }

    if bounds.min_lon() < -180.0 || bounds.max_lon() > 180.0 {
        return Err(GeoNearError::InvalidArgument(format!(
            "Bounding box longitude out of range [-180.0, 180.0]: [{}, {}]",
            bounds.min_lon(),
            bounds.max_lon()
        )));
    }

    Ok(())
}

/// Validates a query point has finite coordinates.
pub fn validate_query_point(point: &GeoPoint) -> Result<()> {
    if !point.is_finite() {
        return Err(GeoNearError::InvalidArgument(format!(
            "Query point must be finite, got: ({}, {})",
            point.lat(),
            point.lon()
        )));
    }
    Ok(())
}

/// Validates a search radius is non-negative and finite.
///
/// ```
/// use geonear::compute::validation::validate_radius;
///
/// assert!(validate_radius(0.0).is_ok());
/// assert!(validate_radius(2.5).is_ok());
/// assert!(validate_radius(-1.0).is_err());
/// assert!(validate_radius(f64::INFINITY).is_err());
/// ```
pub fn validate_radius(radius: f64) -> Result<()> {
    if !radius.is_finite() {
        return Err(GeoNearError::InvalidArgument(format!(
            "Radius must be finite, got: {}",
            radius
        )));
    }

    if radius < 0.0 {
        return Err(GeoNearError::InvalidArgument(format!(
            "Radius must be non-negative, got: {}",
            radius
        )));
    }

    Ok(())
}

pub fn validate_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(GeoNearError::InvalidArgument(
            "k must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(GeoNearError::InvalidArgument(
            "Chunk size must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
