//! Geographic point type wrapping `geo::Point`.
//!
//! Coordinates are handled in (latitude, longitude) order at the API surface,
//! which is how ingestion sources deliver them. Internally the wrapped
//! `geo::Point` keeps the usual x = longitude, y = latitude convention so the
//! `geo` crate's distance algorithms apply unchanged.

use serde::{Deserialize, Serialize};

/// A geographic point in decimal degrees.
///
/// # Examples
///
/// ```
/// use geonear_types::geo::GeoPoint;
///
/// let sp = GeoPoint::new(-23.5505, -46.6333);
/// assert_eq!(sp.lat(), -23.5505);
/// assert_eq!(sp.lon(), -46.6333);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    inner: geo::Point<f64>,
}

impl GeoPoint {
    /// Create a point from latitude and longitude in degrees.
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            inner: geo::Point::new(lon, lat),
        }
    }

    /// Create a point from a `(latitude, longitude)` tuple.
    #[inline]
    pub fn from_lat_lon((lat, lon): (f64, f64)) -> Self {
        Self::new(lat, lon)
    }

    /// Latitude in degrees.
    #[inline]
    pub fn lat(&self) -> f64 {
        self.inner.y()
    }

    /// Longitude in degrees.
    #[inline]
    pub fn lon(&self) -> f64 {
        self.inner.x()
    }

    /// `[lat, lon]` as used by the planar degree metric.
    #[inline]
    pub fn coords(&self) -> [f64; 2] {
        [self.lat(), self.lon()]
    }

    /// Whether both coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.lat().is_finite() && self.lon().is_finite()
    }

    /// Access the inner `geo::Point`.
    #[inline]
    pub fn inner(&self) -> &geo::Point<f64> {
        &self.inner
    }

    /// Euclidean distance in degree space, treating latitude and longitude
    /// as planar axes.
    ///
    /// ```
    /// use geonear_types::geo::GeoPoint;
    ///
    /// let a = GeoPoint::new(0.0, 0.0);
    /// let b = GeoPoint::new(3.0, 4.0);
    /// assert_eq!(a.degree_distance(&b), 5.0);
    /// ```
    #[inline]
    pub fn degree_distance(&self, other: &GeoPoint) -> f64 {
        use geo::Distance;
        geo::Euclidean.distance(self.inner, other.inner)
    }

    /// Haversine great-circle distance in meters.
    #[inline]
    pub fn haversine_distance(&self, other: &GeoPoint) -> f64 {
        use geo::Distance;
        geo::Haversine.distance(self.inner, other.inner)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(point: geo::Point<f64>) -> Self {
        Self { inner: point }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        point.inner
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from(lat_lon: (f64, f64)) -> Self {
        Self::from_lat_lon(lat_lon)
    }
}
