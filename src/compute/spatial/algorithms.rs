//! Kilometer/degree conversions for the planar degree metric.
//!
//! The index works directly on latitude/longitude degrees. A physical radius
//! therefore has to be turned into a degree radius before it can be handed to
//! the tree.

use crate::compute::validation::{validate_query_point, validate_radius};
use crate::error::Result;
use geonear_types::geo::GeoPoint;

/// Kilometers spanned by one degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.32;

/// Latitude used for the longitude conversion is clamped to this magnitude.
/// cos(89.9°) ≈ 0.00175, so the degree radius stays finite at the poles.
pub const MAX_CONVERSION_LAT: f64 = 89.9;

/// Degrees of latitude covering `radius_km`.
#[inline]
pub fn km_to_lat_degrees(radius_km: f64) -> f64 {
    radius_km / KM_PER_DEGREE
}

/// Degrees of longitude covering `radius_km` at latitude `lat`.
#[inline]
pub fn km_to_lon_degrees(radius_km: f64, lat: f64) -> f64 {
    let calc_lat = lat.clamp(-MAX_CONVERSION_LAT, MAX_CONVERSION_LAT);
    radius_km / (KM_PER_DEGREE * calc_lat.to_radians().cos())
}

/// Single symmetric degree radius for a query centred at `center`.
///
/// Takes the larger of the latitude and longitude equivalents, so the degree
/// circle always covers the physical one (over-selection). The longitude
/// factor uses the center's latitude only; queries spanning several degrees
/// of latitude are distorted accordingly.
///
/// # Examples
///
/// ```
/// use geonear::compute::spatial::{degree_radius, KM_PER_DEGREE};
/// use geonear::GeoPoint;
///
/// // At the equator both conversions agree.
/// let r = degree_radius(&GeoPoint::new(0.0, 0.0), KM_PER_DEGREE).unwrap();
/// assert!((r - 1.0).abs() < 1e-12);
///
/// // At 60° a longitude degree is half as long, so the radius doubles.
/// let r = degree_radius(&GeoPoint::new(60.0, 0.0), KM_PER_DEGREE).unwrap();
/// assert!((r - 2.0).abs() < 1e-9);
/// ```
pub fn degree_radius(center: &GeoPoint, radius_km: f64) -> Result<f64> {
    validate_query_point(center)?;
    validate_radius(radius_km)?;

    let lat_radius = km_to_lat_degrees(radius_km);
    let lon_radius = km_to_lon_degrees(radius_km, center.lat());
    Ok(lat_radius.max(lon_radius))
}

/// Haversine distance in kilometers.
#[inline]
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    a.haversine_distance(b) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_conversion() {
        assert!((km_to_lat_degrees(111.32) - 1.0).abs() < 1e-12);
        assert_eq!(km_to_lat_degrees(0.0), 0.0);
    }

    #[test]
    fn test_lon_conversion_grows_with_latitude() {
        let equator = km_to_lon_degrees(10.0, 0.0);
        let sao_paulo = km_to_lon_degrees(10.0, -23.55);
        let oslo = km_to_lon_degrees(10.0, 59.9);
        assert!(equator < sao_paulo);
        assert!(sao_paulo < oslo);
        // Symmetric in hemisphere
        assert!((km_to_lon_degrees(10.0, 23.55) - sao_paulo).abs() < 1e-12);
    }

    #[test]
    fn test_lon_conversion_finite_at_poles() {
        let r = km_to_lon_degrees(1.0, 90.0);
        assert!(r.is_finite());
        assert_eq!(r, km_to_lon_degrees(1.0, 89.9));
    }

    #[test]
    fn test_degree_radius_takes_max() {
        let center = GeoPoint::new(-23.5505, -46.6333);
        let r = degree_radius(&center, 5.0).unwrap();
        assert_eq!(r, km_to_lon_degrees(5.0, center.lat()));
        assert!(r > km_to_lat_degrees(5.0));
    }

    #[test]
    fn test_degree_radius_rejects_bad_input() {
        let center = GeoPoint::new(0.0, 0.0);
        assert!(degree_radius(&center, -1.0).is_err());
        assert!(degree_radius(&center, f64::NAN).is_err());
        assert!(degree_radius(&GeoPoint::new(f64::NAN, 0.0), 1.0).is_err());
    }

    #[test]
    fn test_haversine_km() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0);
        let d = haversine_km(&a, &b);
        assert!(d > 110.0 && d < 112.0);
    }
}
