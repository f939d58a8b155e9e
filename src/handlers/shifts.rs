use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::engine::views::ShiftListing;
use crate::engine::PinStopRequest;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /shifts/pin - add a requester's location to an open shift
pub async fn pin(
    State(state): State<AppState>,
    payload: Result<Json<PinStopRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(request) = payload?;
    state.engine.pin_stop(&request).await?;
    Ok(ApiResponse::no_content())
}

/// GET /shifts/open - shifts still accepting stops
pub async fn open(State(state): State<AppState>) -> ApiResult<ShiftListing> {
    Ok(ApiResponse::success(state.engine.open_shifts().await?))
}
