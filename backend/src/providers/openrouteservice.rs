use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::{Coordinate, RoutePreferences};

use super::{check_status, http_client, ProviderError, ProviderRouteResponse, RouteProvider};

pub const DEFAULT_API_BASE: &str = "api.openrouteservice.org";

/// GeoJSON answer of `/v2/directions/{profile}/geojson`. Coordinates are
/// `[lon, lat]` (optionally followed by elevation).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub summary: Option<Summary>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// Metres and seconds. ORS omits zero values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    #[serde(default)]
    geometry: Option<PointGeometry>,
}

#[derive(Debug, Deserialize)]
struct PointGeometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

pub struct OpenRouteService {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl OpenRouteService {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_base: api_base.into(),
            api_key: api_key.into(),
        })
    }
}

fn avoid_features(prefs: &RoutePreferences) -> Vec<&'static str> {
    let mut avoid = Vec::new();
    if prefs.avoid_tolls {
        avoid.push("tollways");
    }
    if prefs.avoid_highways {
        avoid.push("highways");
    }
    avoid
}

#[async_trait]
impl RouteProvider for OpenRouteService {
    fn name(&self) -> &'static str {
        "openrouteservice"
    }

    #[tracing::instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, ProviderError> {
        let url = format!("https://{}/geocode/search", self.api_base);
        let res = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str()), ("text", address), ("size", "1")])
            .send()
            .await?;
        check_status(&res)?;

        let data: GeocodeResponse = res.json().await?;
        let point = data
            .features
            .into_iter()
            .filter_map(|f| f.geometry)
            .find_map(|g| match g.coordinates.as_slice() {
                [lon, lat, ..] => Some(Coordinate::new(*lat, *lon)),
                _ => None,
            });
        Ok(point)
    }

    #[tracing::instrument(skip(self))]
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        prefs: &RoutePreferences,
    ) -> Result<ProviderRouteResponse, ProviderError> {
        let url = format!("https://{}/v2/directions/driving-car/geojson", self.api_base);
        let mut body = json!({
            "coordinates": [[origin.lon, origin.lat], [destination.lon, destination.lat]],
            "instructions": true,
        });
        let avoid = avoid_features(prefs);
        if !avoid.is_empty() {
            body["options"] = json!({ "avoid_features": avoid });
        }

        let res = self
            .client
            .post(url)
            .header("Authorization", self.api_key.as_str())
            .json(&body)
            .send()
            .await?;
        check_status(&res)?;

        let body = res.text().await?;
        let data: DirectionsResponse = serde_json::from_str(&body)?;
        tracing::debug!("openrouteservice returned {} feature(s)", data.features.len());
        Ok(ProviderRouteResponse::OpenRouteService(data))
    }
}
