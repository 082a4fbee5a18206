use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DashboardError {
    #[error("No data found for query: {query}")]
    NoData { query: String },

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DashboardError {
    pub fn no_data(query: impl Into<String>) -> Self {
        DashboardError::NoData {
            query: query.into(),
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Serialization(err.to_string())
    }
}

impl From<prometheus::Error> for DashboardError {
    fn from(err: prometheus::Error) -> Self {
        DashboardError::Internal(err.to_string())
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match self {
            DashboardError::NoData { .. } => StatusCode::NOT_FOUND,
            DashboardError::InvalidTimeRange(_) => StatusCode::BAD_REQUEST,
            DashboardError::Config(_)
            | DashboardError::Serialization(_)
            | DashboardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_message() {
        let err = DashboardError::no_data("does_not_exist");
        assert_eq!(err.to_string(), "No data found for query: does_not_exist");
    }

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (DashboardError::no_data("x"), StatusCode::NOT_FOUND),
            (
                DashboardError::InvalidTimeRange("abc".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                DashboardError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
