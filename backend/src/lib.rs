pub mod alternatives;
pub mod config;
pub mod congestion;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod normalize;
pub mod planner;
pub mod polyline;
pub mod providers;
pub mod synthetic;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use shared::{ApiError, RoutePlan};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::RouteError;
use crate::planner::{PlanRequest, RoutePlanner};

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<RoutePlanner>,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/routes", post(plan_handler))
        .route("/api/locations", get(locations_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn plan_handler(
    State(state): State<AppState>,
    Json(req): Json<PlanRequest>,
) -> Result<Json<RoutePlan>, (StatusCode, Json<ApiError>)> {
    let plan = state.planner.plan(&req).await.map_err(api_error)?;
    Ok(Json(plan))
}

async fn locations_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.planner.gazetteer().names().map(str::to_string).collect())
}

fn api_error(err: RouteError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        RouteError::LocationNotFound(_) => StatusCode::NOT_FOUND,
        RouteError::InvalidCoordinate { .. } => StatusCode::BAD_REQUEST,
        RouteError::Provider(_) => StatusCode::BAD_GATEWAY,
    };
    tracing::debug!("request rejected with {status}: {err}");
    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
