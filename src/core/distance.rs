use crate::models::GeoPoint;

/// Earth's mean radius in statute miles
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Calculate the Haversine distance between two points in statute miles
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in miles
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = lat2_rad - lat1_rad;
    let delta_lon = lon2.to_radians() - lon1.to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair above 1 for antipodal points
    2.0 * EARTH_RADIUS_MILES * a.min(1.0).sqrt().asin()
}

/// Haversine distance between two validated points, in miles
#[inline]
pub fn distance_miles(from: &GeoPoint, to: &GeoPoint) -> f64 {
    haversine_distance(from.latitude, from.longitude, to.latitude, to.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Springfield, IL to Chicago, IL (approximately 180 miles)
        let springfield = GeoPoint::new(39.7817, -89.6501).unwrap();
        let chicago = GeoPoint::new(41.8781, -87.6298).unwrap();

        let distance = distance_miles(&springfield, &chicago);
        assert!((distance - 180.0).abs() < 10.0, "Distance should be ~180mi, got {}", distance);
    }

    #[test]
    fn test_one_degree_at_equator() {
        let distance = haversine_distance(0.0, 0.0, 0.0, 1.0);
        assert!((distance - 69.17).abs() / 69.17 < 0.005, "got {}", distance);
    }

    #[test]
    fn test_identical_points() {
        assert_eq!(haversine_distance(40.7128, -74.0060, 40.7128, -74.0060), 0.0);
    }

    #[test]
    fn test_antipodal_points() {
        let distance = haversine_distance(0.0, 0.0, 0.0, 180.0);
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_MILES;
        assert!((distance - half_circumference).abs() < 1e-6 * half_circumference);
    }
}
