use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::engine::views::{AssignedRoutes, RouteListing, RouteProgress, StartedRoute};
use crate::engine::{AssignRouteRequest, FinishStopRequest, StartRouteRequest};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /routes/assign - claim a route for a gatherer
pub async fn assign(
    State(state): State<AppState>,
    payload: Result<Json<AssignRouteRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(request) = payload?;
    state.engine.assign_route(&request).await?;
    Ok(ApiResponse::no_content())
}

/// POST /routes/start - begin work on an assigned route
pub async fn start(
    State(state): State<AppState>,
    payload: Result<Json<StartRouteRequest>, JsonRejection>,
) -> ApiResult<StartedRoute> {
    let Json(request) = payload?;
    let started = state.engine.start_route(&request).await?;
    Ok(ApiResponse::success(started))
}

/// POST /routes/finish-picking-point - mark one stop as picked
pub async fn finish_picking_point(
    State(state): State<AppState>,
    payload: Result<Json<FinishStopRequest>, JsonRejection>,
) -> ApiResult<RouteProgress> {
    let Json(request) = payload?;
    let progress = state.engine.finish_stop(&request).await?;
    Ok(ApiResponse::success(progress))
}

/// GET /routes/available - unclaimed routes starting soon
pub async fn available(State(state): State<AppState>) -> ApiResult<RouteListing> {
    Ok(ApiResponse::success(state.engine.available_routes().await?))
}

/// GET /gatherers/:user_id/routes - routes assigned to a gatherer and not yet started
pub async fn assigned(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<AssignedRoutes> {
    Ok(ApiResponse::success(state.engine.assigned_routes(&user_id).await?))
}
