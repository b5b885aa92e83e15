use rand::Rng;
use shared::Coordinate;

const EARTH_RADIUS_KM: f64 = 6_371.0;
const MIN_POINTS: usize = 5;
/// Points per degree of straight-line distance in coordinate space.
const POINTS_PER_DEGREE: f64 = 100.0;

/// Builds a jittered path from `origin` to `destination`.
///
/// The number of intervals is `max(5, floor(d * 100))` where `d` is the
/// straight-line distance in degrees, so the path always has at least six
/// points. Both endpoints are written back after noise is applied and are
/// returned bit-for-bit.
pub fn interpolate<R: Rng + ?Sized>(
    origin: Coordinate,
    destination: Coordinate,
    jitter: f64,
    rng: &mut R,
) -> Vec<Coordinate> {
    let count = point_count(origin, destination);
    let jitter = jitter.abs();

    let mut path: Vec<Coordinate> = (0..=count)
        .map(|i| {
            let t = i as f64 / count as f64;
            let mut point = origin.interpolate(destination, t);
            point.lat = (point.lat + noise(jitter, rng)).clamp(-90.0, 90.0);
            point.lon = (point.lon + noise(jitter, rng)).clamp(-180.0, 180.0);
            point
        })
        .collect();

    path[0] = origin;
    path[count] = destination;
    path
}

/// Adds independent noise to every interior point. Endpoints are untouched.
pub fn perturb<R: Rng + ?Sized>(path: &[Coordinate], jitter: f64, rng: &mut R) -> Vec<Coordinate> {
    let jitter = jitter.abs();
    let last = path.len().saturating_sub(1);
    path.iter()
        .enumerate()
        .map(|(idx, point)| {
            if idx == 0 || idx == last {
                return *point;
            }
            Coordinate {
                lat: (point.lat + noise(jitter, rng)).clamp(-90.0, 90.0),
                lon: (point.lon + noise(jitter, rng)).clamp(-180.0, 180.0),
            }
        })
        .collect()
}

fn point_count(origin: Coordinate, destination: Coordinate) -> usize {
    let dlat = destination.lat - origin.lat;
    let dlon = destination.lon - origin.lon;
    let dist = (dlat * dlat + dlon * dlon).sqrt();
    let scaled = (dist * POINTS_PER_DEGREE).floor();
    if scaled.is_finite() && scaled > MIN_POINTS as f64 {
        scaled as usize
    } else {
        MIN_POINTS
    }
}

fn noise<R: Rng + ?Sized>(jitter: f64, rng: &mut R) -> f64 {
    if jitter > 0.0 {
        rng.gen_range(-jitter..=jitter)
    } else {
        0.0
    }
}

/// Anchor used for the route label.
pub fn midpoint(path: &[Coordinate]) -> Option<Coordinate> {
    path.get(path.len() / 2).copied()
}

pub fn path_length_km(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
}

pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Initial bearing from `a` to `b` in degrees, `[0, 360)`.
pub fn bearing_deg(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}
