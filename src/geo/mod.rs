mod distance;
mod point;

pub use distance::distance_km;
pub use point::GeoPoint;
