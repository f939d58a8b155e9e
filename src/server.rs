use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::handlers::{health, routes, shifts, users};
use crate::state::AppState;

pub fn app(state: AppState, api: &ApiConfig) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .merge(route_routes())
        .merge(shift_routes())
        .route("/users/:user_id/score", get(users::score))
        .with_state(state);

    // Global middleware
    if api.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    if api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn route_routes() -> Router<AppState> {
    Router::new()
        .route("/routes/assign", post(routes::assign))
        .route("/routes/start", post(routes::start))
        .route("/routes/finish-picking-point", post(routes::finish_picking_point))
        .route("/routes/available", get(routes::available))
        .route("/gatherers/:user_id/routes", get(routes::assigned))
}

fn shift_routes() -> Router<AppState> {
    Router::new()
        .route("/shifts/pin", post(shifts::pin))
        .route("/shifts/open", get(shifts::open))
}
