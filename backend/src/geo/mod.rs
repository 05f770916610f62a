//! Geographic helpers shared by the search pipeline and the map view.

mod coords;
mod distance;
pub mod map_view;

pub use coords::{to_number, GeoPoint, RawCoordinate};
pub use distance::{format_distance, haversine_km, EARTH_RADIUS_KM};
