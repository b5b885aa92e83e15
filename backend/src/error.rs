use thiserror::Error;

use crate::providers::ProviderError;

/// Errors a caller of the planning pipeline can see. Routing failures never
/// appear here; they degrade to synthetic routes.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("location not found: {0}")]
    LocationNotFound(String),
    #[error("coordinate out of range: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },
    #[error("geocoding provider error: {0}")]
    Provider(#[from] ProviderError),
}
