use std::sync::Arc;

use route_planner::{AppState, config::PlannerConfig, create_router, planner::RoutePlanner};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "route_planner=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PlannerConfig::from_env().unwrap_or_else(|err| {
        tracing::warn!("{err}; running in synthetic-only mode");
        PlannerConfig::default()
    });

    let provider = config.build_provider().unwrap_or_else(|err| {
        tracing::warn!("could not set up routing provider: {err}");
        None
    });
    match &provider {
        Some(provider) => tracing::info!("routing through {}", provider.name()),
        None => tracing::info!("no routing provider configured, all routes are synthetic"),
    }

    let state = AppState {
        planner: Arc::new(RoutePlanner::new(&config, provider)),
    };
    let app = create_router(state);

    let addr = config.bind_addr;
    tracing::info!("starting route planner on http://{addr}");
    tracing::info!("  POST /api/routes - plan three route options");
    tracing::info!("  GET /api/locations - list named demo places");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listening socket");
    axum::serve(listener, app).await.expect("serve http");
}
