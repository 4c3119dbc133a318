//! Great-circle distance

use crate::types::GeoPoint;

/// Mean Earth radius in meters (IUGG)
pub const EARTH_MEAN_RADIUS_METERS: f64 = 6_371_008.8;

/// Haversine distance between two points, in meters
pub fn haversine_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Clamp guards rounding drift above 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_MEAN_RADIUS_METERS * c
}

/// Distance rounded to the nearest whole meter
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> u64 {
    let d = haversine_meters(a, b).round();
    if d.is_finite() && d > 0.0 {
        d as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        let p = GeoPoint::new(12.9716, 77.5946);
        assert_eq!(distance_meters(&p, &p), 0);
    }

    #[test]
    fn test_symmetric() {
        let a = GeoPoint::new(12.9716, 77.5946);
        let b = GeoPoint::new(12.9750, 77.5990);
        assert_eq!(distance_meters(&a, &b), distance_meters(&b, &a));
    }

    #[test]
    fn test_one_degree_latitude() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        // R * pi / 180
        assert_eq!(distance_meters(&a, &b), 111_195);
    }
}
