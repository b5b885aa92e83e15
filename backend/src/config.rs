use std::{net::SocketAddr, sync::Arc, time::Duration};

use crate::providers::{
    google, openrouteservice, GoogleMaps, OpenRouteService, ProviderError, RouteProvider,
};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown ROUTE_PROVIDER {0:?} (expected none, openrouteservice or google)")]
    UnknownProvider(String),
    #[error("invalid PROVIDER_TIMEOUT_SECS {0:?}")]
    InvalidTimeout(String),
    #[error("{0} must be set for the selected provider")]
    MissingApiKey(&'static str),
    #[error("invalid BIND_ADDR {0:?}")]
    InvalidBindAddr(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSettings {
    OpenRouteService { api_base: String, api_key: String },
    GoogleMaps { api_base: String, api_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    pub provider: Option<ProviderSettings>,
    pub provider_timeout: Duration,
    pub bind_addr: SocketAddr,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            provider: None,
            provider_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let provider_name = lookup("ROUTE_PROVIDER").unwrap_or_else(|| "none".to_string());
        let provider = Self::provider_from_lookup(&provider_name, &lookup)?;

        let provider_timeout = match lookup("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let raw_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(raw_addr.clone()))?;

        Ok(Self {
            provider,
            provider_timeout,
            bind_addr,
        })
    }

    /// Resolves a provider name (`none`, `openrouteservice`/`ors`,
    /// `google`/`google_maps`) with its key and base URL.
    pub fn provider_from_lookup(
        name: &str,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<Option<ProviderSettings>, ConfigError> {
        let settings = match name.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "offline" => None,
            "openrouteservice" | "ors" => Some(ProviderSettings::OpenRouteService {
                api_base: lookup("ORS_API_BASE")
                    .unwrap_or_else(|| openrouteservice::DEFAULT_API_BASE.to_string()),
                api_key: lookup("ORS_API_KEY").ok_or(ConfigError::MissingApiKey("ORS_API_KEY"))?,
            }),
            "google" | "google_maps" => Some(ProviderSettings::GoogleMaps {
                api_base: lookup("GOOGLE_MAPS_API_BASE")
                    .unwrap_or_else(|| google::DEFAULT_API_BASE.to_string()),
                api_key: lookup("GOOGLE_MAPS_API_KEY")
                    .ok_or(ConfigError::MissingApiKey("GOOGLE_MAPS_API_KEY"))?,
            }),
            other => return Err(ConfigError::UnknownProvider(other.to_string())),
        };
        Ok(settings)
    }

    /// Constructs the provider handle handed to the planner.
    pub fn build_provider(&self) -> Result<Option<Arc<dyn RouteProvider>>, ProviderError> {
        let provider: Arc<dyn RouteProvider> = match &self.provider {
            None => return Ok(None),
            Some(ProviderSettings::OpenRouteService { api_base, api_key }) => Arc::new(
                OpenRouteService::new(api_base.as_str(), api_key.as_str(), self.provider_timeout)?,
            ),
            Some(ProviderSettings::GoogleMaps { api_base, api_key }) => Arc::new(GoogleMaps::new(
                api_base.as_str(),
                api_key.as_str(),
                self.provider_timeout,
            )?),
        };
        Ok(Some(provider))
    }
}
