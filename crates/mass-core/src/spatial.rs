//! Spatial math for dead reckoning and safety-gate timing.

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// One knot in meters per second.
pub const KNOTS_TO_MPS: f64 = 0.514444;

/// Calculate distance between two points in meters using the Haversine
/// formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

// ==== Local ENU scaling ====
// Conversions between meters and degrees using latitude-aware scaling.

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Convert a north/south offset in meters to degrees latitude.
pub fn meters_to_lat(meters: f64, ref_lat_deg: f64) -> f64 {
    let meters_per_deg = meters_per_deg_lat(ref_lat_deg).max(1e-9);
    meters / meters_per_deg
}

/// Convert an east/west offset in meters to degrees longitude.
/// Requires the reference latitude for proper scaling.
pub fn meters_to_lon(meters: f64, ref_lat_deg: f64) -> f64 {
    let meters_per_deg = meters_per_deg_lon(ref_lat_deg).max(1e-9);
    meters / meters_per_deg
}

// ==== Courses ====

/// Normalize a course into [0, 360).
pub fn normalize_course_deg(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Signed turn from `from_deg` to `to_deg` along the shorter arc, in
/// (-180, 180]. A command of 359 from a current course of 1 yields -2,
/// never +358.
pub fn shortest_turn_deg(from_deg: f64, to_deg: f64) -> f64 {
    let mut delta = (to_deg - from_deg).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Seconds until the current course line first enters a circular gate.
///
/// Projects gate and velocity into a local ENU frame around the vessel and
/// solves the ray/circle quadratic. Returns `Some(0.0)` when already inside
/// the radius, `None` when stopped or when the course never intersects the
/// circle.
pub fn time_to_circle(
    lat: f64,
    lon: f64,
    cog_deg: f64,
    sog_knots: f64,
    gate_lat: f64,
    gate_lon: f64,
    radius_m: f64,
) -> Option<f64> {
    let dx = (gate_lon - lon) * meters_per_deg_lon(lat);
    let dy = (gate_lat - lat) * meters_per_deg_lat(lat);
    let dist = dx.hypot(dy);

    if dist <= radius_m {
        return Some(0.0);
    }

    let speed_mps = sog_knots * KNOTS_TO_MPS;
    if speed_mps <= 0.0 {
        return None;
    }

    let theta = cog_deg.to_radians();
    let vx = speed_mps * theta.sin();
    let vy = speed_mps * theta.cos();

    let a = vx * vx + vy * vy;
    let b = 2.0 * (dx * vx + dy * vy);
    let c = dx * dx + dy * dy - radius_m * radius_m;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t1 = (b - sqrt_d) / (2.0 * a);
    let t2 = (b + sqrt_d) / (2.0 * a);

    [t1, t2]
        .into_iter()
        .filter(|t| *t > 0.0)
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn haversine_same_point() {
        let dist = haversine_distance(30.0, -40.0, 30.0, -40.0);
        assert!(dist < 0.001);
    }

    #[test]
    fn shortest_turn_crosses_north_wrap() {
        assert_eq!(shortest_turn_deg(1.0, 359.0), -2.0);
        assert_eq!(shortest_turn_deg(359.0, 1.0), 2.0);
        assert_eq!(shortest_turn_deg(90.0, 270.0), 180.0);
    }

    #[test]
    fn normalize_wraps_negative_courses() {
        assert_eq!(normalize_course_deg(-1.0), 359.0);
        assert_eq!(normalize_course_deg(360.0), 0.0);
        assert_eq!(normalize_course_deg(725.0), 5.0);
    }

    #[test]
    fn time_to_circle_hits_gate_dead_ahead() {
        // Gate ~1852m due north, 10 knots => ~360s to the 100m edge.
        let gate_lat = 30.0 + meters_to_lat(1852.0, 30.0);
        let t = time_to_circle(30.0, -40.0, 0.0, 10.0, gate_lat, -40.0, 100.0)
            .expect("gate is on the course line");
        let expected = (1852.0 - 100.0) / (10.0 * KNOTS_TO_MPS);
        assert!((t - expected).abs() < 2.0, "t={t} expected~{expected}");
    }

    #[test]
    fn time_to_circle_none_when_stopped() {
        let gate_lat = 30.0 + meters_to_lat(1852.0, 30.0);
        assert_eq!(
            time_to_circle(30.0, -40.0, 0.0, 0.0, gate_lat, -40.0, 100.0),
            None
        );
    }

    #[test]
    fn time_to_circle_none_when_course_misses() {
        // Gate due north but vessel steaming due east.
        let gate_lat = 30.0 + meters_to_lat(1852.0, 30.0);
        assert_eq!(
            time_to_circle(30.0, -40.0, 90.0, 10.0, gate_lat, -40.0, 100.0),
            None
        );
    }

    #[test]
    fn time_to_circle_zero_inside_radius() {
        assert_eq!(
            time_to_circle(30.0, -40.0, 0.0, 5.0, 30.0, -40.0, 100.0),
            Some(0.0)
        );
    }
}
