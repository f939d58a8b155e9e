use axum::extract::{Path, State};

use crate::engine::views::UserScore;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /users/:user_id/score - accumulated balance over the user's locations
pub async fn score(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<UserScore> {
    Ok(ApiResponse::success(state.engine.user_score(&user_id).await?))
}
