use crate::error::{AppError, Result};
use crate::models::route::{LoopRouteRequest, RouteResponse};
use crate::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// POST /routes/loop
/// Generate up to three diverse running loops that start and end at the same point
pub async fn create_loop_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoopRouteRequest>,
) -> Result<Json<RouteResponse>> {
    request.validate().map_err(AppError::InvalidRequest)?;

    tracing::info!(
        lat = request.start_point.lat,
        lng = request.start_point.lng,
        distance_km = request.distance_km,
        prefer_trails = request.prefer_trails,
        avoid_hills = request.avoid_hills,
        "Loop route request: ({:.4}, {:.4}), {:.1}km",
        request.start_point.lat,
        request.start_point.lng,
        request.distance_km
    );

    let routes = state
        .route_generator
        .generate_route(&request.into_route_request())
        .await?;

    Ok(Json(RouteResponse { routes }))
}
