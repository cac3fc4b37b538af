pub mod algorithms;
pub use algorithms::{
    KM_PER_DEGREE, MAX_CONVERSION_LAT, degree_radius, haversine_km, km_to_lat_degrees,
    km_to_lon_degrees,
};

pub mod kdtree;
pub use kdtree::SpatialIndex;
