// Great-circle geometry between events and stations
// Haversine distance and azimuth on a spherical Earth

/// Mean Earth radius in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

fn valid(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && lat.abs() <= 90.0 && lon.abs() <= 360.0
}

/// Central angle between two points in degrees (haversine).
/// Returns None for non-finite or out-of-range coordinates.
pub fn locations2degrees(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Option<f64> {
    if !valid(lat1, lon1) || !valid(lat2, lon2) {
        return None;
    }

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();
    Some(c.to_degrees())
}

/// Epicentral distance in km
pub fn epicentral_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Option<f64> {
    locations2degrees(lat1, lon1, lat2, lon2).map(|deg| deg.to_radians() * EARTH_RADIUS_KM)
}
