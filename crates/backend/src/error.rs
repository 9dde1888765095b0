//! Mapping of `StatsError` onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use steamstats_core::StatsError;

/// Handler error; renders as `{"error": "..."}` with a status derived from the error kind.
#[derive(Debug)]
pub struct ApiError(pub StatsError);

impl From<StatsError> for ApiError {
    fn from(e: StatsError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            StatsError::MissingInput(_) | StatsError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            StatsError::MissingCreationDate | StatsError::DivisionUndefined => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            StatsError::NotFound(_) => StatusCode::NOT_FOUND,
            StatsError::UpstreamUnavailable { status: Some(503), .. } => StatusCode::SERVICE_UNAVAILABLE,
            StatsError::UpstreamUnavailable { .. } | StatsError::UpstreamMalformed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            StatsError::Config(_) | StatsError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Internal error");
            "Internal server error".to_string()
        } else {
            if status.is_server_error() {
                tracing::warn!(error = %self.0, "Upstream failure");
            }
            self.0.to_string()
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
