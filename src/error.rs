use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Routing API error: {0}")]
    RoutingApi(String),

    #[error("Overpass API error: {0}")]
    OverpassApi(String),

    #[error("Popularity API error: {0}")]
    PopularityApi(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Route generation failed: {0}")]
    RouteGeneration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// The caller-visible failure raised when no candidate survives filtering.
    pub fn no_valid_route(detail: impl Into<String>) -> Self {
        AppError::RouteGeneration(detail.into())
    }
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::RoutingApi(ref e) => {
                tracing::error!("Routing API error: {}", e);
                (StatusCode::BAD_GATEWAY, "Routing service error".to_string())
            }
            AppError::OverpassApi(ref e) => {
                tracing::error!("Overpass API error: {}", e);
                (StatusCode::BAD_GATEWAY, "Feature discovery error".to_string())
            }
            AppError::PopularityApi(ref e) => {
                tracing::error!("Popularity API error: {}", e);
                (StatusCode::BAD_GATEWAY, "Popularity service error".to_string())
            }
            AppError::Timeout(ref e) => {
                tracing::warn!("Upstream timeout: {}", e);
                (StatusCode::GATEWAY_TIMEOUT, "Upstream service timed out".to_string())
            }
            AppError::InvalidRequest(e) => (StatusCode::BAD_REQUEST, e),
            AppError::RouteGeneration(ref e) => {
                tracing::warn!("Route generation failed: {}", e);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "could not generate a valid route; try a different start point or distance"
                        .to_string(),
                )
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_generation_maps_to_unprocessable() {
        let response = AppError::no_valid_route("0 of 8 candidates survived").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_invalid_request_maps_to_bad_request() {
        let response = AppError::InvalidRequest("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_display_includes_detail() {
        let err = AppError::Timeout("routing after 30s".to_string());
        assert_eq!(err.to_string(), "Timed out: routing after 30s");
    }
}
