pub mod gazetteer;
pub mod google;
pub mod openrouteservice;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use shared::{Coordinate, RoutePreferences};

pub use gazetteer::Gazetteer;
pub use google::GoogleMaps;
pub use openrouteservice::OpenRouteService;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request to provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider answered with HTTP status {0}")]
    Status(u16),
    #[error("provider reported {0}")]
    Upstream(String),
    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),
    #[error("unreadable provider payload: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenRouteService,
    GoogleMaps,
}

/// Raw route payload as returned by one of the supported providers.
#[derive(Debug, Clone)]
pub enum ProviderRouteResponse {
    OpenRouteService(openrouteservice::DirectionsResponse),
    GoogleMaps(google::DirectionsResponse),
}

impl ProviderRouteResponse {
    pub fn parse(kind: ProviderKind, body: &str) -> Result<Self, ProviderError> {
        Ok(match kind {
            ProviderKind::OpenRouteService => Self::OpenRouteService(serde_json::from_str(body)?),
            ProviderKind::GoogleMaps => Self::GoogleMaps(serde_json::from_str(body)?),
        })
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenRouteService(_) => ProviderKind::OpenRouteService,
            Self::GoogleMaps(_) => ProviderKind::GoogleMaps,
        }
    }
}

/// Geocoding and routing backend. Implementations must be usable from
/// concurrent requests; they hold no per-request state.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the provider knows no such place.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, ProviderError>;

    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        prefs: &RoutePreferences,
    ) -> Result<ProviderRouteResponse, ProviderError>;
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

pub(crate) fn check_status(res: &Response) -> Result<(), ProviderError> {
    let status = res.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ProviderError::Status(status.as_u16()))
    }
}
