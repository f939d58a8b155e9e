use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Reciapp API (Rust)",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Picking route assignment and completion service",
            "endpoints": {
                "assign": "POST /routes/assign",
                "start": "POST /routes/start",
                "finish": "POST /routes/finish-picking-point",
                "available": "GET /routes/available",
                "assigned": "GET /gatherers/:user_id/routes",
                "pin": "POST /shifts/pin",
                "shifts": "GET /shifts/open",
                "score": "GET /users/:user_id/score",
                "health": "GET /health",
            }
        }
    }))
}

/// GET /health - store reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = state.engine.time().now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": state.engine.time().to_iso8601(&now),
                    "store": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Store health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "store unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": state.engine.time().to_iso8601(&now),
                        "store_error": e.to_string()
                    }
                })),
            )
        }
    }
}
