use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::Config,
    dashboard::Dashboard,
    metrics::RequestTimer,
    provider::{MetricsProvider, MockProvider, SystemClock},
    DashboardError, Result,
};

pub mod handlers;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub provider: Arc<dyn MetricsProvider>,
    pub project_id: u64,
}

impl AppState {
    pub fn new(provider: Arc<dyn MetricsProvider>, config: &Config) -> Self {
        let dashboard = Dashboard::new(
            provider.clone(),
            Arc::new(SystemClock),
            config.project_id,
            config.default_time_range,
        );
        Self {
            dashboard: Arc::new(dashboard),
            provider,
            project_id: config.project_id,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/dashboard", get(handlers::get_dashboard))
        .route("/api/v1/dashboard/time-range", put(handlers::set_time_range))
        .route("/api/v1/dashboard/refresh", post(handlers::refresh))
        .route("/api/v1/query/:name", get(handlers::get_query))
        .route("/metrics", get(handlers::metrics))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn track_requests(request: Request, next: Next) -> Response {
    let _timer = RequestTimer::new();
    next.run(request).await
}

/// Builds the mock-backed dashboard, starts its queries and serves the API
/// until ctrl-c.
pub async fn start_server(config: Config) -> Result<()> {
    let provider: Arc<dyn MetricsProvider> = Arc::new(MockProvider::from_config(&config));
    let state = AppState::new(provider, &config);
    state.dashboard.load();

    let app = router(state);
    let addr = config.bind_addr();
    info!("Starting dashboard service on {}", addr);

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        DashboardError::Internal(format!("Failed to bind to address {addr}: {e}"))
    })?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DashboardError::Internal(format!("Server error: {e}")))?;

    info!("Dashboard service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
