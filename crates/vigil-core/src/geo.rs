//! Pure great-circle distance math. No side effects, no error cases —
//! coordinate validation happens at the ingestion boundary.

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two WGS84 coordinates, using the
/// haversine formula.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
  let d_lat = (lat2 - lat1).to_radians();
  let d_lon = (lon2 - lon1).to_radians();

  let a = (d_lat / 2.0).sin().powi(2)
    + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
  let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

  EARTH_RADIUS_M * c
}

/// Whether a latitude/longitude pair is within the valid WGS84 ranges.
pub fn coordinates_valid(lat: f64, lng: f64) -> bool {
  lat.is_finite()
    && lng.is_finite()
    && (-90.0..=90.0).contains(&lat)
    && (-180.0..=180.0).contains(&lng)
}
