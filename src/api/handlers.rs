use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppState;
use crate::{
    dashboard::DashboardView, metrics as self_metrics, models::MetricResponse,
    time_range::TimeRange, Result,
};

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRangeRequest {
    pub time_range: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryRangeParams {
    pub range: Option<String>,
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Json<DashboardView> {
    state.dashboard.load();

    let view = if params.wait {
        state.dashboard.settled().await
    } else {
        state.dashboard.snapshot()
    };
    Json(view)
}

pub async fn set_time_range(
    State(state): State<AppState>,
    Json(request): Json<TimeRangeRequest>,
) -> Result<(StatusCode, Json<DashboardView>)> {
    let range: TimeRange = request.time_range.parse()?;
    info!("Setting time range: {}", range);

    let status = if state.dashboard.set_time_range(range) {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(state.dashboard.snapshot())))
}

pub async fn refresh(State(state): State<AppState>) -> (StatusCode, Json<DashboardView>) {
    let restarted = state.dashboard.refresh().len();
    info!("Refreshing dashboard: {} queries restarted", restarted);
    (StatusCode::ACCEPTED, Json(state.dashboard.snapshot()))
}

pub async fn get_query(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<QueryRangeParams>,
) -> Result<Json<MetricResponse>> {
    info!("Running query: {}", name);

    let range = params
        .range
        .as_deref()
        .map(str::parse::<TimeRange>)
        .transpose()?;
    let response = state
        .provider
        .query(state.project_id, &name, range.as_ref())
        .await?;
    Ok(Json(response))
}

pub async fn metrics() -> Result<impl IntoResponse> {
    let body = self_metrics::gather()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

pub async fn health() -> &'static str {
    "ok"
}
