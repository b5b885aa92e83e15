//! Provider responses → canonical [`Route`], with synthetic fallback.

use rand::Rng;
use shared::{Coordinate, DirectionStep, Route, RoutePreferences};

use crate::congestion::{self, mean_congestion, CongestionPolicy, Stride};
use crate::geometry::path_length_km;
use crate::polyline::{self, PolylineError};
use crate::providers::{google, openrouteservice, ProviderRouteResponse};
use crate::synthetic;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("provider response contains no route")]
    NoRoutes,
    #[error("route geometry has {0} point(s), need at least 2")]
    TooFewPoints(usize),
    #[error("coordinate out of range: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },
    #[error("undecodable polyline: {0}")]
    Polyline(#[from] PolylineError),
    #[error("invalid {0} in provider response")]
    InvalidMeasure(&'static str),
}

/// Axis order of coordinate pairs in a provider payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateOrder {
    LatLon,
    LonLat,
}

impl CoordinateOrder {
    pub fn to_coordinate(self, pair: &[f64]) -> Result<Coordinate, NormalizeError> {
        let (a, b) = match pair {
            [a, b, ..] => (*a, *b),
            _ => return Err(NormalizeError::TooFewPoints(pair.len())),
        };
        let coord = match self {
            CoordinateOrder::LatLon => Coordinate::new(a, b),
            CoordinateOrder::LonLat => Coordinate::new(b, a),
        };
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(NormalizeError::InvalidCoordinate {
                lat: coord.lat,
                lon: coord.lon,
            })
        }
    }
}

const METRES_PER_KM: f64 = 1000.0;
const SECONDS_PER_MIN: f64 = 60.0;
const PROVIDER_ROUTE_NAME: &str = "Provider Route";

/// Canonical route for a request.
///
/// A missing or undecodable provider response is not an error for the
/// caller: the synthetic option matching `prefs.optimize_for` is returned.
pub fn normalize<R: Rng + ?Sized>(
    response: Option<&ProviderRouteResponse>,
    origin: Coordinate,
    destination: Coordinate,
    prefs: &RoutePreferences,
    rng: &mut R,
) -> Route {
    let Some(response) = response else {
        tracing::debug!("no provider response, synthesizing route");
        return synthetic::generate_preferred(origin, destination, prefs, rng);
    };

    match try_normalize(response, origin, destination, prefs, rng) {
        Ok(route) => route,
        Err(err) => {
            tracing::warn!(
                "falling back to synthetic route, {:?} response unusable: {err}",
                response.kind()
            );
            synthetic::generate_preferred(origin, destination, prefs, rng)
        }
    }
}

/// Decoded provider fields before the canonical route is assembled.
struct Decoded {
    path: Vec<Coordinate>,
    distance_km: Option<f64>,
    duration_min: Option<f64>,
    steps: Vec<DirectionStep>,
}

pub fn try_normalize<R: Rng + ?Sized>(
    response: &ProviderRouteResponse,
    origin: Coordinate,
    destination: Coordinate,
    prefs: &RoutePreferences,
    rng: &mut R,
) -> Result<Route, NormalizeError> {
    let decoded = match response {
        ProviderRouteResponse::OpenRouteService(data) => decode_openrouteservice(data)?,
        ProviderRouteResponse::GoogleMaps(data) => decode_google(data)?,
    };

    let mut path = decoded.path;
    if path.len() < 2 {
        return Err(NormalizeError::TooFewPoints(path.len()));
    }
    // Providers snap endpoints to the road network; the canonical route
    // starts and ends where the user asked.
    let last = path.len() - 1;
    path[0] = origin;
    path[last] = destination;

    let step_distance: f64 = decoded.steps.iter().map(|s| s.distance_km).sum();
    let step_duration: f64 = decoded.steps.iter().map(|s| s.duration_min).sum();
    let distance_km = decoded
        .distance_km
        .or((!decoded.steps.is_empty()).then_some(step_distance))
        .unwrap_or_else(|| path_length_km(&path));
    let duration_min = decoded.duration_min.unwrap_or(step_duration);

    let segments = congestion::sample(path.len(), Stride::Fifths, CongestionPolicy::Categorical, rng);

    Ok(Route {
        name: PROVIDER_ROUTE_NAME.to_string(),
        congestion: mean_congestion(&segments),
        path,
        distance_km,
        duration_min,
        segments,
        uses_tolls: !prefs.avoid_tolls,
        uses_highways: !prefs.avoid_highways,
        steps: decoded.steps,
        incident: None,
    })
}

fn decode_openrouteservice(data: &openrouteservice::DirectionsResponse) -> Result<Decoded, NormalizeError> {
    let feature = data.features.first().ok_or(NormalizeError::NoRoutes)?;
    let geometry = feature.geometry.as_ref().ok_or(NormalizeError::NoRoutes)?;

    let path = geometry
        .coordinates
        .iter()
        .map(|pair| CoordinateOrder::LonLat.to_coordinate(pair))
        .collect::<Result<Vec<_>, _>>()?;

    let summary = feature.properties.summary.clone().unwrap_or_default();
    let distance_km = summary
        .distance
        .map(|m| measure(m, "distance"))
        .transpose()?
        .map(|m| m / METRES_PER_KM);
    let duration_min = summary
        .duration
        .map(|s| measure(s, "duration"))
        .transpose()?
        .map(|s| s / SECONDS_PER_MIN);

    let steps = feature
        .properties
        .segments
        .iter()
        .flat_map(|segment| &segment.steps)
        .map(|step| -> Result<DirectionStep, NormalizeError> {
            Ok(DirectionStep {
                instruction: strip_markup(&step.instruction),
                distance_km: measure(step.distance, "step distance")? / METRES_PER_KM,
                duration_min: measure(step.duration, "step duration")? / SECONDS_PER_MIN,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Decoded {
        path,
        distance_km,
        duration_min,
        steps,
    })
}

fn decode_google(data: &google::DirectionsResponse) -> Result<Decoded, NormalizeError> {
    if data.status != "OK" {
        return Err(NormalizeError::NoRoutes);
    }
    let route = data.routes.first().ok_or(NormalizeError::NoRoutes)?;
    let encoded = route
        .overview_polyline
        .as_ref()
        .map(|p| p.points.as_str())
        .ok_or(NormalizeError::NoRoutes)?;

    let path = polyline::decode(encoded)?
        .iter()
        .map(|pair| CoordinateOrder::LatLon.to_coordinate(pair))
        .collect::<Result<Vec<_>, _>>()?;

    let mut distance_m = Some(0.0);
    let mut duration_s = Some(0.0);
    let mut steps = Vec::new();
    for leg in &route.legs {
        distance_m = match (distance_m, &leg.distance) {
            (Some(total), Some(d)) => Some(total + measure(d.value, "distance")?),
            _ => None,
        };
        duration_s = match (duration_s, &leg.duration) {
            (Some(total), Some(d)) => Some(total + measure(d.value, "duration")?),
            _ => None,
        };
        for step in &leg.steps {
            let distance = step.distance.as_ref().map_or(0.0, |d| d.value);
            let duration = step.duration.as_ref().map_or(0.0, |d| d.value);
            steps.push(DirectionStep {
                instruction: strip_markup(&step.html_instructions),
                distance_km: measure(distance, "step distance")? / METRES_PER_KM,
                duration_min: measure(duration, "step duration")? / SECONDS_PER_MIN,
            });
        }
    }
    if route.legs.is_empty() {
        distance_m = None;
        duration_s = None;
    }

    Ok(Decoded {
        path,
        distance_km: distance_m.map(|m| m / METRES_PER_KM),
        duration_min: duration_s.map(|s| s / SECONDS_PER_MIN),
        steps,
    })
}

fn measure(value: f64, what: &'static str) -> Result<f64, NormalizeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(NormalizeError::InvalidMeasure(what))
    }
}

/// Removes HTML tags from provider instruction text. Block boundaries
/// (`<div>`, `<br>`) become spaces, common entities are decoded and runs of
/// whitespace collapse to one space.
pub fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for ch in html.chars() {
        match (in_tag, ch) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (true, '>') => {
                in_tag = false;
                let name: String = tag
                    .trim_start_matches('/')
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_ascii_lowercase();
                if matches!(name.as_str(), "div" | "br" | "p" | "li") {
                    text.push(' ');
                }
            }
            (true, c) => tag.push(c),
            (false, c) => text.push(c),
        }
    }

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;
    use crate::providers::ProviderKind;

    const ORIGIN: Coordinate = Coordinate {
        lat: 40.712,
        lon: -74.006,
    };
    const DESTINATION: Coordinate = Coordinate {
        lat: 40.640,
        lon: -73.779,
    };

    fn ors(body: &str) -> ProviderRouteResponse {
        ProviderRouteResponse::parse(ProviderKind::OpenRouteService, body).unwrap()
    }

    fn google(body: &str) -> ProviderRouteResponse {
        ProviderRouteResponse::parse(ProviderKind::GoogleMaps, body).unwrap()
    }

    #[test]
    fn strips_bold_and_div_markup() {
        assert_eq!(
            strip_markup("Turn <b>right</b> onto <b>Main St</b><div style=\"font-size:0.9em\">Destination will be on the left</div>"),
            "Turn right onto Main St Destination will be on the left"
        );
        assert_eq!(strip_markup("Take exit&nbsp;12 toward <b>A &amp; B</b>"), "Take exit 12 toward A & B");
        assert_eq!(strip_markup("plain"), "plain");
        assert_eq!(strip_markup("  "), "");
    }

    #[test]
    fn reorders_lon_lat_pairs() {
        let coord = CoordinateOrder::LonLat.to_coordinate(&[-74.006, 40.712, 12.0]).unwrap();
        assert_eq!(coord, ORIGIN);
        let coord = CoordinateOrder::LatLon.to_coordinate(&[40.712, -74.006]).unwrap();
        assert_eq!(coord, ORIGIN);
    }

    #[test]
    fn rejects_swapped_out_of_range_pairs() {
        // Longitude -120 read as latitude.
        assert!(matches!(
            CoordinateOrder::LatLon.to_coordinate(&[-120.0, 38.0]),
            Err(NormalizeError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            CoordinateOrder::LatLon.to_coordinate(&[1.0]),
            Err(NormalizeError::TooFewPoints(1))
        ));
    }

    #[test]
    fn openrouteservice_geometry_and_units() {
        let body = r#"{"features":[{"geometry":{"coordinates":[[-74.0059,40.7121],[-73.9,40.68],[-73.7791,40.6401]]},
            "properties":{"summary":{"distance":21500.0,"duration":1800.0},
            "segments":[{"steps":[{"instruction":"Head <b>east</b>","distance":21500.0,"duration":1800.0}]}]}}]}"#;
        let mut rng = SmallRng::seed_from_u64(1);
        let route = try_normalize(&ors(body), ORIGIN, DESTINATION, &RoutePreferences::default(), &mut rng).unwrap();

        assert_eq!(route.path.len(), 3);
        assert_eq!(route.path[1], Coordinate::new(40.68, -73.9));
        assert!((route.distance_km - 21.5).abs() < 1e-9);
        assert!((route.duration_min - 30.0).abs() < 1e-9);
        assert_eq!(route.steps[0].instruction, "Head east");
        route.check_invariants(ORIGIN, DESTINATION).unwrap();
    }

    #[test]
    fn openrouteservice_missing_summary_uses_steps() {
        let body = r#"{"features":[{"geometry":{"coordinates":[[-74.0,40.7],[-73.8,40.6]]},
            "properties":{"segments":[{"steps":[{"instruction":"a","distance":1000.0,"duration":60.0},
            {"instruction":"b","distance":500.0,"duration":30.0}]}]}}]}"#;
        let mut rng = SmallRng::seed_from_u64(1);
        let route = try_normalize(&ors(body), ORIGIN, DESTINATION, &RoutePreferences::default(), &mut rng).unwrap();
        assert!((route.distance_km - 1.5).abs() < 1e-9);
        assert!((route.duration_min - 1.5).abs() < 1e-9);
    }

    #[test]
    fn empty_features_is_no_route() {
        let mut rng = SmallRng::seed_from_u64(1);
        let err = try_normalize(&ors(r#"{"features":[]}"#), ORIGIN, DESTINATION, &RoutePreferences::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::NoRoutes));
    }

    #[test]
    fn negative_summary_is_rejected() {
        let body = r#"{"features":[{"geometry":{"coordinates":[[-74.0,40.7],[-73.8,40.6]]},
            "properties":{"summary":{"distance":-5.0,"duration":10.0}}}]}"#;
        let mut rng = SmallRng::seed_from_u64(1);
        let err = try_normalize(&ors(body), ORIGIN, DESTINATION, &RoutePreferences::default(), &mut rng).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidMeasure("distance")));
    }

    #[test]
    fn google_polyline_and_legs() {
        let body = r#"{"status":"OK","routes":[{"summary":"I-5","overview_polyline":{"points":"_p~iF~ps|U_ulLnnqC_mqNvxq`@"},
            "legs":[{"distance":{"text":"1 km","value":1000},"duration":{"text":"2 mins","value":120},
            "steps":[{"html_instructions":"Head <b>north</b>","distance":{"value":1000},"duration":{"value":120}}]}]}]}"#;
        let origin = Coordinate::new(38.5, -120.2);
        let destination = Coordinate::new(43.252, -126.453);
        let mut rng = SmallRng::seed_from_u64(1);
        let route = try_normalize(&google(body), origin, destination, &RoutePreferences::default(), &mut rng).unwrap();

        assert_eq!(route.path.len(), 3);
        assert!((route.path[1].lat - 40.7).abs() < 1e-9);
        assert!((route.path[1].lon + 120.95).abs() < 1e-9);
        assert!((route.distance_km - 1.0).abs() < 1e-9);
        assert!((route.duration_min - 2.0).abs() < 1e-9);
        assert_eq!(route.steps[0].instruction, "Head north");
        route.check_invariants(origin, destination).unwrap();
    }

    #[test]
    fn google_zero_results_is_no_route() {
        let mut rng = SmallRng::seed_from_u64(1);
        let err = try_normalize(
            &google(r#"{"status":"ZERO_RESULTS","routes":[]}"#),
            ORIGIN,
            DESTINATION,
            &RoutePreferences::default(),
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, NormalizeError::NoRoutes));
    }

    #[test]
    fn google_truncated_polyline_is_rejected() {
        let body = r#"{"status":"OK","routes":[{"overview_polyline":{"points":"_p~iF~ps|"},"legs":[]}]}"#;
        let mut rng = SmallRng::seed_from_u64(1);
        let err = try_normalize(&google(body), ORIGIN, DESTINATION, &RoutePreferences::default(), &mut rng).unwrap_err();
        assert!(matches!(err, NormalizeError::Polyline(_)));
    }

    #[test]
    fn oversized_polyline_values_fall_back_to_synthesis() {
        let points = format!("}}{}F", "~".repeat(11)).repeat(6);
        let body = format!(
            r#"{{"status":"OK","routes":[{{"overview_polyline":{{"points":"{points}"}},"legs":[]}}]}}"#
        );
        let response = google(&body);
        let mut rng = SmallRng::seed_from_u64(1);

        let err = try_normalize(&response, ORIGIN, DESTINATION, &RoutePreferences::default(), &mut rng).unwrap_err();
        assert!(matches!(err, NormalizeError::Polyline(PolylineError::OutOfRange(0))));

        let route = normalize(Some(&response), ORIGIN, DESTINATION, &RoutePreferences::default(), &mut rng);
        assert_eq!(route.name, "Fastest Route");
        route.check_invariants(ORIGIN, DESTINATION).unwrap();
    }

    #[test]
    fn segments_partition_provider_path() {
        let coordinates: Vec<String> = (0..=40)
            .map(|i| format!("[{},{}]", -74.0 + i as f64 * 0.005, 40.7 - i as f64 * 0.002))
            .collect();
        let body = format!(
            r#"{{"features":[{{"geometry":{{"coordinates":[{}]}},"properties":{{}}}}]}}"#,
            coordinates.join(",")
        );
        let mut rng = SmallRng::seed_from_u64(8);
        let route = try_normalize(&ors(&body), ORIGIN, DESTINATION, &RoutePreferences::default(), &mut rng).unwrap();
        route.check_invariants(ORIGIN, DESTINATION).unwrap();
        assert_eq!(route.segments.len(), 5);
        assert!(route.distance_km > 0.0);
        assert_eq!(route.duration_min, 0.0);
    }

    #[test]
    fn absent_or_malformed_response_falls_back() {
        let prefs = RoutePreferences::default();
        let mut rng = SmallRng::seed_from_u64(3);

        let route = normalize(None, ORIGIN, DESTINATION, &prefs, &mut rng);
        assert_eq!(route.name, "Fastest Route");
        route.check_invariants(ORIGIN, DESTINATION).unwrap();

        let empty = ors(r#"{"features":[]}"#);
        let route = normalize(Some(&empty), ORIGIN, DESTINATION, &prefs, &mut rng);
        assert_eq!(route.name, "Fastest Route");
        route.check_invariants(ORIGIN, DESTINATION).unwrap();
        assert!(route.distance_km > 0.0);
    }
}
