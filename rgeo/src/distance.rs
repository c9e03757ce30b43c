//! Great-circle distance on a spherical Earth.

/// Mean Earth radius used to turn angles into kilometers.
pub const EARTH_RADIUS_KM: f64 = 6378.1;

/// Angle between two points on the unit sphere, in radians (`0..=PI`).
///
/// Uses the spherical law of cosines on colatitude/longitude. The cosine is
/// clamped to `[-1, 1]` before `acos` so rounding never yields NaN.
///
/// # Examples
///
/// ```
/// use rgeo::distance::great_circle_angle;
/// use std::f64::consts::PI;
///
/// assert_eq!(great_circle_angle(10.0, 20.0, 10.0, 20.0), 0.0);
/// assert!((great_circle_angle(0.0, 0.0, 0.0, 180.0) - PI).abs() < 1e-12);
/// ```
pub fn great_circle_angle(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if lat1 == lat2 && lon1 == lon2 {
        return 0.0;
    }

    // phi = colatitude, theta = longitude
    let phi1 = (90.0 - lat1).to_radians();
    let phi2 = (90.0 - lat2).to_radians();
    let theta1 = lon1.to_radians();
    let theta2 = lon2.to_radians();

    let cos = phi1.sin() * phi2.sin() * (theta1 - theta2).cos() + phi1.cos() * phi2.cos();

    cos.clamp(-1.0, 1.0).acos()
}

/// Great-circle distance between two points in kilometers.
///
/// # Examples
///
/// ```
/// use rgeo::distance::distance_km;
///
/// // One degree of latitude is roughly 111 km
/// let d = distance_km(0.0, 0.0, 1.0, 0.0);
/// assert!(d > 110.0 && d < 112.0);
/// ```
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    great_circle_angle(lat1, lon1, lat2, lon2) * EARTH_RADIUS_KM
}
