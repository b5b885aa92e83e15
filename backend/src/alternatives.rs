//! Cost trade-offs between the three labelled route options, and composition
//! of those options from a single provider route.
//!
//! Providers used here return one path per request, so the alternatives are
//! derived by scaling the base route's totals and perturbing its geometry
//! rather than by asking the provider for independent paths.

use rand::Rng;
use shared::{DirectionStep, OptimizeFor, Route, RoutePreferences};

use crate::congestion::{self, CongestionPolicy, Stride};
use crate::geometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alternative {
    Fastest,
    Shortest,
    Eco,
}

impl Alternative {
    pub const ALL: [Alternative; 3] = [Self::Fastest, Self::Shortest, Self::Eco];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fastest => "Fastest Route",
            Self::Shortest => "Shortest Route",
            Self::Eco => "Eco-Friendly Route",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Fastest => 0,
            Self::Shortest => 1,
            Self::Eco => 2,
        }
    }

    /// The option a user optimizing for `goal` is pointed at.
    pub fn preferred(goal: OptimizeFor) -> Self {
        match goal {
            OptimizeFor::Time => Self::Fastest,
            OptimizeFor::Distance => Self::Shortest,
            OptimizeFor::Eco => Self::Eco,
        }
    }

    /// Later options diverge more from the straight line.
    pub fn jitter(self) -> f64 {
        0.005 * (self.index() + 1) as f64
    }

    pub fn distance_factor(self) -> f64 {
        match self {
            Self::Fastest => 1.0,
            Self::Shortest => 0.85,
            Self::Eco => 1.1,
        }
    }

    pub fn duration_factor(self, prefs: &RoutePreferences) -> f64 {
        match self {
            Self::Fastest if prefs.avoid_highways => 1.2,
            Self::Fastest => 1.0,
            Self::Shortest => 1.2,
            Self::Eco => 1.1,
        }
    }

    pub fn congestion_policy(self) -> CongestionPolicy {
        match self {
            Self::Fastest => CongestionPolicy::continuous(0.6, 0.8),
            Self::Shortest => CongestionPolicy::continuous(0.7, 0.9),
            Self::Eco => CongestionPolicy::continuous(0.5, 0.7),
        }
    }

    /// `(uses_tolls, uses_highways)`.
    pub fn road_features<R: Rng + ?Sized>(self, prefs: &RoutePreferences, rng: &mut R) -> (bool, bool) {
        match self {
            Self::Fastest => (!prefs.avoid_tolls, !prefs.avoid_highways),
            Self::Shortest => (false, false),
            Self::Eco => (rng.gen_bool(0.5), rng.gen_bool(0.5)),
        }
    }
}

/// Derives the three labelled options from one base route.
///
/// The fastest option keeps the base geometry; the others perturb its interior
/// points so they can be told apart on a map. Steps are scaled with the same
/// factors as the totals.
pub fn compose<R: Rng + ?Sized>(base: &Route, prefs: &RoutePreferences, rng: &mut R) -> Vec<Route> {
    Alternative::ALL
        .iter()
        .map(|&alt| {
            let distance_factor = alt.distance_factor();
            let duration_factor = alt.duration_factor(prefs);
            let policy = alt.congestion_policy();

            let congestion = policy.draw(rng);
            let (uses_tolls, uses_highways) = alt.road_features(prefs, rng);
            let path = match alt {
                Alternative::Fastest => base.path.clone(),
                _ => geometry::perturb(&base.path, alt.jitter(), rng),
            };
            let segments = congestion::sample(path.len(), Stride::Fifths, policy, rng);
            let steps = base
                .steps
                .iter()
                .map(|step| DirectionStep {
                    instruction: step.instruction.clone(),
                    distance_km: step.distance_km * distance_factor,
                    duration_min: step.duration_min * duration_factor,
                })
                .collect();

            Route {
                name: alt.name().to_string(),
                path,
                distance_km: base.distance_km * distance_factor,
                duration_min: base.duration_min * duration_factor,
                congestion,
                segments,
                uses_tolls,
                uses_highways,
                steps,
                incident: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, SeedableRng};
    use shared::{Congestion, Coordinate};

    use super::*;

    fn base_route() -> Route {
        let origin = Coordinate::new(40.712, -74.006);
        let destination = Coordinate::new(40.640, -73.779);
        let mut rng = SmallRng::seed_from_u64(11);
        let path = geometry::interpolate(origin, destination, 0.0, &mut rng);
        let segments = congestion::sample(path.len(), Stride::Fifths, CongestionPolicy::Categorical, &mut rng);
        Route {
            name: "Provider Route".into(),
            path,
            distance_km: 20.0,
            duration_min: 30.0,
            congestion: Congestion::new(0.4),
            segments,
            uses_tolls: true,
            uses_highways: true,
            steps: vec![
                DirectionStep {
                    instruction: "Head east".into(),
                    distance_km: 12.0,
                    duration_min: 18.0,
                },
                DirectionStep {
                    instruction: "Arrive".into(),
                    distance_km: 8.0,
                    duration_min: 12.0,
                },
            ],
            incident: None,
        }
    }

    #[test]
    fn composes_three_named_options() {
        let base = base_route();
        let mut rng = SmallRng::seed_from_u64(2);
        let routes = compose(&base, &RoutePreferences::default(), &mut rng);
        let names: Vec<&str> = routes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Fastest Route", "Shortest Route", "Eco-Friendly Route"]);
    }

    #[test]
    fn applies_relative_factors() {
        let base = base_route();
        let prefs = RoutePreferences {
            avoid_highways: true,
            ..RoutePreferences::default()
        };
        let mut rng = SmallRng::seed_from_u64(2);
        let routes = compose(&base, &prefs, &mut rng);

        assert_eq!(routes[0].distance_km, 20.0);
        assert!((routes[0].duration_min - 36.0).abs() < 1e-9);
        assert!((routes[1].distance_km - 17.0).abs() < 1e-9);
        assert!((routes[1].duration_min - 36.0).abs() < 1e-9);
        assert!((routes[2].distance_km - 22.0).abs() < 1e-9);
        assert!((routes[2].duration_min - 33.0).abs() < 1e-9);
        assert!(!routes[0].uses_highways);
        assert!(!routes[1].uses_tolls);
    }

    #[test]
    fn scales_steps_with_totals() {
        let base = base_route();
        let mut rng = SmallRng::seed_from_u64(2);
        let shortest = &compose(&base, &RoutePreferences::default(), &mut rng)[1];
        let distance: f64 = shortest.steps.iter().map(|s| s.distance_km).sum();
        assert!((distance - shortest.distance_km).abs() < 1e-9);
    }

    #[test]
    fn keeps_invariants() {
        let base = base_route();
        let origin = base.path[0];
        let destination = *base.path.last().unwrap();
        let mut rng = SmallRng::seed_from_u64(2);
        for route in compose(&base, &RoutePreferences::default(), &mut rng) {
            route.check_invariants(origin, destination).unwrap();
            let (lo, hi) = match route.name.as_str() {
                "Fastest Route" => (0.6, 0.8),
                "Shortest Route" => (0.7, 0.9),
                _ => (0.5, 0.7),
            };
            assert!((lo..=hi).contains(&route.congestion.score()));
        }
    }

    #[test]
    fn preferred_option_follows_goal() {
        assert_eq!(Alternative::preferred(OptimizeFor::Time), Alternative::Fastest);
        assert_eq!(Alternative::preferred(OptimizeFor::Distance), Alternative::Shortest);
        assert_eq!(Alternative::preferred(OptimizeFor::Eco), Alternative::Eco);
        assert_eq!(Alternative::Eco.jitter(), 0.015);
    }
}
