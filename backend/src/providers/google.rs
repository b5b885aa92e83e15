use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::{Coordinate, RoutePreferences};

use super::{check_status, http_client, ProviderError, ProviderRouteResponse, RouteProvider};

pub const DEFAULT_API_BASE: &str = "maps.googleapis.com";

/// Directions API answer. Distances are metres, durations seconds, the
/// overview path is an encoded polyline in lat/lng order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectionsRoute {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub overview_polyline: Option<EncodedPolyline>,
    #[serde(default)]
    pub legs: Vec<Leg>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncodedPolyline {
    #[serde(default)]
    pub points: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leg {
    #[serde(default)]
    pub distance: Option<TextValue>,
    #[serde(default)]
    pub duration: Option<TextValue>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextValue {
    #[serde(default)]
    pub text: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub html_instructions: String,
    #[serde(default)]
    pub distance: Option<TextValue>,
    #[serde(default)]
    pub duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

pub struct GoogleMaps {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GoogleMaps {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_base: api_base.into(),
            api_key: api_key.into(),
        })
    }
}

fn lat_lng(point: Coordinate) -> String {
    format!("{},{}", point.lat, point.lon)
}

fn avoid_param(prefs: &RoutePreferences) -> Option<String> {
    let avoid: Vec<&str> = [(prefs.avoid_tolls, "tolls"), (prefs.avoid_highways, "highways")]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
    (!avoid.is_empty()).then(|| avoid.join("|"))
}

#[async_trait]
impl RouteProvider for GoogleMaps {
    fn name(&self) -> &'static str {
        "google_maps"
    }

    #[tracing::instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, ProviderError> {
        let url = format!("https://{}/maps/api/geocode/json", self.api_base);
        let res = self
            .client
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("address", address)])
            .send()
            .await?;
        check_status(&res)?;

        let data: GeocodeResponse = res.json().await?;
        match data.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(data
                .results
                .first()
                .map(|r| Coordinate::new(r.geometry.location.lat, r.geometry.location.lng))),
            other => Err(ProviderError::Upstream(other.to_string())),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        prefs: &RoutePreferences,
    ) -> Result<ProviderRouteResponse, ProviderError> {
        let url = format!("https://{}/maps/api/directions/json", self.api_base);
        let mut request = self.client.get(url).query(&[
            ("key", self.api_key.clone()),
            ("origin", lat_lng(origin)),
            ("destination", lat_lng(destination)),
        ]);
        if let Some(avoid) = avoid_param(prefs) {
            request = request.query(&[("avoid", avoid)]);
        }

        let res = request.send().await?;
        check_status(&res)?;

        let body = res.text().await?;
        let data: DirectionsResponse = serde_json::from_str(&body)?;
        match data.status.as_str() {
            // ZERO_RESULTS is left for the normalizer to judge.
            "OK" | "ZERO_RESULTS" => Ok(ProviderRouteResponse::GoogleMaps(data)),
            other => {
                let detail = data.error_message.as_deref().unwrap_or("no details");
                Err(ProviderError::Upstream(format!("{other}: {detail}")))
            }
        }
    }
}
