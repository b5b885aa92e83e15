use rand::{seq::SliceRandom, Rng};
use shared::{
    Coordinate, DirectionStep, Incident, IncidentKind, Route, RoutePreferences, Severity,
    TrafficIncident,
};

use crate::alternatives::Alternative;
use crate::congestion::{self, Stride};
use crate::geometry::{self, bearing_deg, haversine_km, path_length_km};

const BASE_DISTANCE_KM: f64 = 15.0;
const BASE_DURATION_MIN: f64 = 25.0;
const INCIDENT_PROBABILITY: f64 = 0.7;
const MAX_LEGS: usize = 6;

/// Generates the three synthetic options for one request.
///
/// The base distance and duration are drawn once so the options stay
/// comparable: the shortest is always `0.85 * base` while the fastest is at
/// least `base`.
pub fn generate<R: Rng + ?Sized>(
    origin: Coordinate,
    destination: Coordinate,
    prefs: &RoutePreferences,
    rng: &mut R,
) -> Vec<Route> {
    let base_distance = BASE_DISTANCE_KM + rng.gen_range(-3.0..3.0);
    let base_time = BASE_DURATION_MIN + rng.gen_range(-5.0..5.0);

    Alternative::ALL
        .iter()
        .map(|&alt| {
            let distance_km = match alt {
                Alternative::Fastest => base_distance + rng.gen_range(0.0..2.0),
                _ => base_distance * alt.distance_factor(),
            };
            let duration_min = base_time * alt.duration_factor(prefs);
            let policy = alt.congestion_policy();
            let congestion = policy.draw(rng);
            let (uses_tolls, uses_highways) = alt.road_features(prefs, rng);

            let path = geometry::interpolate(origin, destination, alt.jitter(), rng);
            let segments = congestion::sample(path.len(), Stride::Fifths, policy, rng);
            let steps = synthesize_steps(&path, distance_km, duration_min);
            let incident = sample_incident(&path, rng);

            Route {
                name: alt.name().to_string(),
                path,
                distance_km,
                duration_min,
                congestion,
                segments,
                uses_tolls,
                uses_highways,
                steps,
                incident,
            }
        })
        .collect()
}

/// Single synthetic route for the option matching the user's goal.
pub fn generate_preferred<R: Rng + ?Sized>(
    origin: Coordinate,
    destination: Coordinate,
    prefs: &RoutePreferences,
    rng: &mut R,
) -> Route {
    let index = Alternative::preferred(prefs.optimize_for).index();
    generate(origin, destination, prefs, rng).swap_remove(index)
}

pub fn sample_incident<R: Rng + ?Sized>(path: &[Coordinate], rng: &mut R) -> Option<Incident> {
    if path.len() < 3 || !rng.gen_bool(INCIDENT_PROBABILITY) {
        return None;
    }
    let path_index = rng.gen_range(1..=path.len() - 2);
    Some(Incident {
        path_index,
        location: path[path_index],
        description: "Traffic incident: Delay of 5-10 minutes".into(),
    })
}

/// Turn-by-turn steps read off the path geometry.
///
/// The path is cut into at most six legs; each leg's share of the totals is
/// proportional to its haversine length, so step distances add up to
/// `distance_km`.
pub fn synthesize_steps(path: &[Coordinate], distance_km: f64, duration_min: f64) -> Vec<DirectionStep> {
    if path.len() < 2 {
        return Vec::new();
    }
    let intervals = path.len() - 1;
    let legs = intervals.min(MAX_LEGS);
    let bounds: Vec<usize> = (0..=legs).map(|k| k * intervals / legs).collect();

    let lengths: Vec<f64> = bounds
        .windows(2)
        .map(|w| path_length_km(&path[w[0]..=w[1]]))
        .collect();
    let total: f64 = lengths.iter().sum();

    let mut steps = Vec::with_capacity(legs + 1);
    let mut previous_bearing = None;
    for (leg, w) in bounds.windows(2).enumerate() {
        let (from, to) = (path[w[0]], path[w[1]]);
        let share = if total > 0.0 {
            lengths[leg] / total
        } else {
            1.0 / legs as f64
        };
        let bearing = bearing_deg(from, to);
        let instruction = match previous_bearing {
            None => format!("Head {}", compass(bearing)),
            Some(prev) if haversine_km(from, to) > 0.0 => turn(prev, bearing).to_string(),
            Some(_) => "Continue straight".to_string(),
        };
        previous_bearing = Some(bearing);

        steps.push(DirectionStep {
            instruction,
            distance_km: distance_km * share,
            duration_min: duration_min * share,
        });
    }

    steps.push(DirectionStep {
        instruction: "Arrive at destination".into(),
        distance_km: 0.0,
        duration_min: 0.0,
    });
    steps
}

fn compass(bearing: f64) -> &'static str {
    const POINTS: [&str; 8] = [
        "north",
        "northeast",
        "east",
        "southeast",
        "south",
        "southwest",
        "west",
        "northwest",
    ];
    POINTS[((bearing + 22.5) / 45.0) as usize % POINTS.len()]
}

fn turn(previous: f64, current: f64) -> &'static str {
    let delta = (current - previous + 540.0) % 360.0 - 180.0;
    match delta {
        d if d > 30.0 => "Turn right",
        d if d < -30.0 => "Turn left",
        d if d > 10.0 => "Keep right",
        d if d < -10.0 => "Keep left",
        _ => "Continue straight",
    }
}

/// Current conditions report shown alongside the options.
pub fn traffic_report<R: Rng + ?Sized>(rng: &mut R) -> Vec<TrafficIncident> {
    let mut incidents = Vec::new();

    if rng.gen_bool(0.7) {
        let street = ["Broadway", "Main St", "5th Avenue"]
            .choose(rng)
            .copied()
            .unwrap_or("Broadway");
        incidents.push(TrafficIncident {
            kind: IncidentKind::Accident,
            location: format!("Near {street}"),
            delay_min: rng.gen_range(5..=20),
            severity: Severity::Moderate,
        });
    }

    if rng.gen_bool(0.5) {
        let place = ["Highway 101", "Bridge St", "Downtown"]
            .choose(rng)
            .copied()
            .unwrap_or("Downtown");
        incidents.push(TrafficIncident {
            kind: IncidentKind::Construction,
            location: format!("On {place}"),
            delay_min: rng.gen_range(3..=15),
            severity: Severity::Minor,
        });
    }

    incidents
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;

    const ORIGIN: Coordinate = Coordinate {
        lat: 40.712,
        lon: -74.006,
    };
    const DESTINATION: Coordinate = Coordinate {
        lat: 40.640,
        lon: -73.779,
    };

    #[test]
    fn generates_three_named_routes() {
        let mut rng = SmallRng::seed_from_u64(42);
        let routes = generate(ORIGIN, DESTINATION, &RoutePreferences::default(), &mut rng);
        let names: Vec<&str> = routes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Fastest Route", "Shortest Route", "Eco-Friendly Route"]);
        for route in &routes {
            route.check_invariants(ORIGIN, DESTINATION).unwrap();
            assert!(route.distance_km > 0.0);
            assert!(route.duration_min > 0.0);
        }
    }

    #[test]
    fn shortest_is_not_longer_than_fastest() {
        for seed in 0..50 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let routes = generate(ORIGIN, DESTINATION, &RoutePreferences::default(), &mut rng);
            assert!(routes[1].distance_km <= routes[0].distance_km);
        }
    }

    #[test]
    fn options_share_one_base_draw() {
        let mut rng = SmallRng::seed_from_u64(7);
        let routes = generate(ORIGIN, DESTINATION, &RoutePreferences::default(), &mut rng);
        let base_distance = routes[1].distance_km / 0.85;
        assert!((routes[2].distance_km - base_distance * 1.1).abs() < 1e-9);
        assert!((12.0..18.0).contains(&base_distance));

        let base_time = routes[1].duration_min / 1.2;
        assert!((routes[0].duration_min - base_time).abs() < 1e-9);
        assert!((routes[2].duration_min - base_time * 1.1).abs() < 1e-9);
        assert!((20.0..30.0).contains(&base_time));
        assert!(routes[0].distance_km - base_distance < 2.0);
    }

    #[test]
    fn honours_avoidance_preferences() {
        let prefs = RoutePreferences {
            avoid_tolls: true,
            avoid_highways: true,
            ..RoutePreferences::default()
        };
        let mut rng = SmallRng::seed_from_u64(3);
        let routes = generate(ORIGIN, DESTINATION, &prefs, &mut rng);
        assert!(!routes[0].uses_tolls);
        assert!(!routes[0].uses_highways);
        assert!((routes[0].duration_min - routes[1].duration_min).abs() < 1e-9);
    }

    #[test]
    fn later_options_diverge_more() {
        let mut rng = SmallRng::seed_from_u64(3);
        let routes = generate(ORIGIN, DESTINATION, &RoutePreferences::default(), &mut rng);
        for (route, jitter) in routes.iter().zip([0.005, 0.010, 0.015]) {
            let n = (route.path.len() - 1) as f64;
            for (i, p) in route.path.iter().enumerate() {
                let line = ORIGIN.interpolate(DESTINATION, i as f64 / n);
                assert!((p.lat - line.lat).abs() <= jitter + 1e-9);
            }
        }
    }

    #[test]
    fn incidents_sit_inside_the_path() {
        let mut seen = 0;
        for seed in 0..40 {
            let mut rng = SmallRng::seed_from_u64(seed);
            for route in generate(ORIGIN, DESTINATION, &RoutePreferences::default(), &mut rng) {
                if let Some(incident) = route.incident {
                    seen += 1;
                    assert!(incident.path_index >= 1);
                    assert!(incident.path_index <= route.path.len() - 2);
                    assert_eq!(incident.location, route.path[incident.path_index]);
                }
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn steps_add_up_to_route_totals() {
        let mut rng = SmallRng::seed_from_u64(5);
        let path = geometry::interpolate(ORIGIN, DESTINATION, 0.005, &mut rng);
        let steps = synthesize_steps(&path, 17.5, 26.0);
        assert_eq!(steps.len(), MAX_LEGS + 1);
        assert!(steps[0].instruction.starts_with("Head "));
        assert_eq!(steps.last().unwrap().instruction, "Arrive at destination");
        let distance: f64 = steps.iter().map(|s| s.distance_km).sum();
        let duration: f64 = steps.iter().map(|s| s.duration_min).sum();
        assert!((distance - 17.5).abs() < 1e-9);
        assert!((duration - 26.0).abs() < 1e-9);
    }

    #[test]
    fn steps_for_zero_length_path() {
        let steps = synthesize_steps(&[ORIGIN, ORIGIN, ORIGIN], 3.0, 6.0);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1].instruction, "Continue straight");
        assert!((steps[0].distance_km - 1.5).abs() < 1e-9);
    }

    #[test]
    fn compass_and_turns() {
        assert_eq!(compass(0.0), "north");
        assert_eq!(compass(350.0), "north");
        assert_eq!(compass(100.0), "east");
        assert_eq!(compass(225.0), "southwest");
        assert_eq!(turn(0.0, 90.0), "Turn right");
        assert_eq!(turn(10.0, 300.0), "Turn left");
        assert_eq!(turn(350.0, 10.0), "Keep right");
        assert_eq!(turn(90.0, 92.0), "Continue straight");
    }

    #[test]
    fn traffic_report_values_in_range() {
        for seed in 0..30 {
            let mut rng = SmallRng::seed_from_u64(seed);
            for incident in traffic_report(&mut rng) {
                match incident.kind {
                    IncidentKind::Accident => {
                        assert!((5..=20).contains(&incident.delay_min));
                        assert!(incident.location.starts_with("Near "));
                        assert_eq!(incident.severity, Severity::Moderate);
                    }
                    IncidentKind::Construction => {
                        assert!((3..=15).contains(&incident.delay_min));
                        assert!(incident.location.starts_with("On "));
                        assert_eq!(incident.severity, Severity::Minor);
                    }
                }
            }
        }
    }

    #[test]
    fn preferred_route_follows_goal() {
        let prefs = RoutePreferences {
            optimize_for: shared::OptimizeFor::Eco,
            ..RoutePreferences::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let route = generate_preferred(ORIGIN, DESTINATION, &prefs, &mut rng);
        assert_eq!(route.name, "Eco-Friendly Route");
    }
}
