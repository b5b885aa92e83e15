use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use shared::{Coordinate, Route, RoutePlan, RoutePreferences, RouteSource};

use crate::alternatives::{self, Alternative};
use crate::config::PlannerConfig;
use crate::error::RouteError;
use crate::normalize::try_normalize;
use crate::providers::{Gazetteer, ProviderError, ProviderRouteResponse, RouteProvider};
use crate::synthetic;

/// A route endpoint as given by the user: coordinates or a place name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Waypoint {
    Coordinate(Coordinate),
    Named(String),
}

impl FromStr for Waypoint {
    type Err = std::convert::Infallible;

    /// `"lat,lon"` parses as coordinates, anything else is a place name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = s
            .split_once(',')
            .and_then(|(lat, lon)| Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?)));
        Ok(match parsed {
            Some((lat, lon)) => Waypoint::Coordinate(Coordinate::new(lat, lon)),
            None => Waypoint::Named(s.trim().to_string()),
        })
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Waypoint::Coordinate(c) => write!(f, "{},{}", c.lat, c.lon),
            Waypoint::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub origin: Waypoint,
    pub destination: Waypoint,
    #[serde(default)]
    pub preferences: RoutePreferences,
    /// Fixes every random draw of the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// The request pipeline: resolve endpoints, ask the provider (bounded by a
/// timeout), normalize or synthesize, compose the options.
///
/// Holds no per-request state, so one instance serves concurrent requests.
pub struct RoutePlanner {
    gazetteer: Gazetteer,
    provider: Option<Arc<dyn RouteProvider>>,
    provider_timeout: Duration,
}

impl RoutePlanner {
    pub fn new(config: &PlannerConfig, provider: Option<Arc<dyn RouteProvider>>) -> Self {
        Self {
            gazetteer: Gazetteer::demo(),
            provider,
            provider_timeout: config.provider_timeout,
        }
    }

    /// Offline planner: demo gazetteer and synthetic routes only.
    pub fn synthetic_only() -> Self {
        Self::new(&PlannerConfig::default(), None)
    }

    pub fn with_gazetteer(mut self, gazetteer: Gazetteer) -> Self {
        self.gazetteer = gazetteer;
        self
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    pub fn provider_name(&self) -> Option<&'static str> {
        self.provider.as_ref().map(|p| p.name())
    }

    #[tracing::instrument(skip(self))]
    pub async fn plan(&self, req: &PlanRequest) -> Result<RoutePlan, RouteError> {
        let origin = self.resolve(&req.origin).await?;
        let destination = self.resolve(&req.destination).await?;

        let response = self.fetch_route(origin, destination, &req.preferences).await;

        let mut rng = match req.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Ok(assemble(
            response.as_ref(),
            origin,
            destination,
            &req.preferences,
            &mut rng,
        ))
    }

    /// Gazetteer first, then the provider. Not-found is reported, never
    /// replaced with a default place.
    pub async fn resolve(&self, waypoint: &Waypoint) -> Result<Coordinate, RouteError> {
        let coord = match waypoint {
            Waypoint::Coordinate(coord) => *coord,
            Waypoint::Named(name) => match self.gazetteer.lookup(name) {
                Some(coord) => coord,
                None => self.geocode(name).await?,
            },
        };

        if !coord.is_valid() {
            return Err(RouteError::InvalidCoordinate {
                lat: coord.lat,
                lon: coord.lon,
            });
        }
        Ok(coord)
    }

    async fn geocode(&self, name: &str) -> Result<Coordinate, RouteError> {
        let Some(provider) = &self.provider else {
            return Err(RouteError::LocationNotFound(name.to_string()));
        };

        let found = tokio::time::timeout(self.provider_timeout, provider.geocode(name))
            .await
            .map_err(|_| ProviderError::Timeout(self.provider_timeout))??;
        found.ok_or_else(|| RouteError::LocationNotFound(name.to_string()))
    }

    /// `None` when there is no provider or the call failed; failures are
    /// logged and left for synthesis.
    async fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        prefs: &RoutePreferences,
    ) -> Option<ProviderRouteResponse> {
        let provider = self.provider.as_ref()?;
        let call = provider.route(origin, destination, prefs);

        match tokio::time::timeout(self.provider_timeout, call).await {
            Ok(Ok(response)) => Some(response),
            Ok(Err(err)) => {
                tracing::warn!("{} routing failed: {err}", provider.name());
                None
            }
            Err(_) => {
                tracing::warn!(
                    "{} routing timed out after {:?}",
                    provider.name(),
                    self.provider_timeout
                );
                None
            }
        }
    }
}

/// Builds the plan from an optional provider response.
///
/// A usable response becomes the base of three composed options; anything
/// else yields the three synthetic options. Either way the plan has three
/// routes and a recommendation following `prefs.optimize_for`.
pub fn assemble<R: Rng + ?Sized>(
    response: Option<&ProviderRouteResponse>,
    origin: Coordinate,
    destination: Coordinate,
    prefs: &RoutePreferences,
    rng: &mut R,
) -> RoutePlan {
    let base = response.and_then(|response| {
        try_normalize(response, origin, destination, prefs, rng)
            .map_err(|err| {
                tracing::warn!("provider response unusable, synthesizing routes: {err}");
            })
            .ok()
    });

    let (routes, source) = match base {
        Some(base) => {
            let routes = alternatives::compose(&base, prefs, rng)
                .into_iter()
                .map(|mut route| {
                    route.incident = synthetic::sample_incident(&route.path, rng);
                    route
                })
                .collect();
            (routes, RouteSource::Provider)
        }
        None => (
            synthetic::generate(origin, destination, prefs, rng),
            RouteSource::Synthetic,
        ),
    };

    log_violations(&routes, origin, destination);

    RoutePlan {
        routes,
        recommended: Alternative::preferred(prefs.optimize_for).index(),
        source,
        incidents: synthetic::traffic_report(rng),
    }
}

fn log_violations(routes: &[Route], origin: Coordinate, destination: Coordinate) {
    for route in routes {
        if let Err(err) = route.check_invariants(origin, destination) {
            tracing::warn!("route {:?} violates invariants: {err}", route.name);
        }
    }
}
