use crate::geo::GeoPoint;
use geo::Rect;
use serde::{Deserialize, Serialize};

/// A 2D axis-aligned geographic bounding box.
///
/// Wraps `geo::Rect` with x = longitude and y = latitude. Boundaries are
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    /// The underlying geometric rectangle
    pub rect: Rect,
}

impl BoundingBox2D {
    /// Create a new bounding box from latitude and longitude limits.
    ///
    /// # Arguments
    ///
    /// * `min_lat` - Southern edge
    /// * `min_lon` - Western edge
    /// * `max_lat` - Northern edge
    /// * `max_lon` - Eastern edge
    ///
    /// # Examples
    ///
    /// ```
    /// use geonear_types::bbox::BoundingBox2D;
    ///
    /// let bbox = BoundingBox2D::new(40.7, -74.0, 40.8, -73.9);
    /// assert_eq!(bbox.min_lat(), 40.7);
    /// ```
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        // Rect::new normalises swapped corners.
        Self {
            rect: Rect::new(
                geo::coord! { x: min_lon, y: min_lat },
                geo::coord! { x: max_lon, y: max_lat },
            ),
        }
    }

    /// The whole globe: latitude [-90, 90], longitude [-180, 180].
    pub fn world() -> Self {
        Self::new(-90.0, -180.0, 90.0, 180.0)
    }

    /// Metropolitan São Paulo: latitude [-24, -23], longitude [-47, -46].
    pub fn sao_paulo() -> Self {
        Self::new(-24.0, -47.0, -23.0, -46.0)
    }

    pub fn min_lat(&self) -> f64 {
        self.rect.min().y
    }

    pub fn min_lon(&self) -> f64 {
        self.rect.min().x
    }

    pub fn max_lat(&self) -> f64 {
        self.rect.max().y
    }

    pub fn max_lon(&self) -> f64 {
        self.rect.max().x
    }

    /// Whether every edge is a finite number.
    pub fn is_finite(&self) -> bool {
        self.min_lat().is_finite()
            && self.min_lon().is_finite()
            && self.max_lat().is_finite()
            && self.max_lon().is_finite()
    }

    /// Check if a point is contained within this bounding box (edges included).
    pub fn contains_point(&self, point: &GeoPoint) -> bool {
        point.lat() >= self.min_lat()
            && point.lat() <= self.max_lat()
            && point.lon() >= self.min_lon()
            && point.lon() <= self.max_lon()
    }

    /// Smallest box covering all `points`, or `None` when there are none.
    pub fn covering<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_lat, mut min_lon) = (first.lat(), first.lon());
        let (mut max_lat, mut max_lon) = (min_lat, min_lon);
        for p in iter {
            min_lat = min_lat.min(p.lat());
            min_lon = min_lon.min(p.lon());
            max_lat = max_lat.max(p.lat());
            max_lon = max_lon.max(p.lon());
        }
        Some(Self::new(min_lat, min_lon, max_lat, max_lon))
    }
}

impl Default for BoundingBox2D {
    fn default() -> Self {
        Self::world()
    }
}
