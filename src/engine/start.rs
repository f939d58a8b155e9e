use tracing::{info, warn};

use crate::engine::views::{ActiveRouteView, StartedRoute};
use crate::engine::{require, EngineError, StartRouteRequest};
use crate::models::RouteStatus;
use crate::services::{RouteFinder, RouteInitiator, TimeService, UserDirectory};

/// Start work on an assigned route. Only the first call stamps `initiated_at`.
pub async fn start_route<U, R>(
    users: &U,
    routes: &R,
    time: &TimeService,
    request: &StartRouteRequest,
) -> Result<StartedRoute, EngineError>
where
    U: UserDirectory + ?Sized,
    R: RouteFinder + RouteInitiator + ?Sized,
{
    require("user_id", &request.user_id)?;
    require("route_id", &request.route_id)?;

    let user = users.find_user(&request.user_id).await?;
    let mut route = routes.find(&request.route_id).await?;

    if !user.is_gatherer() {
        warn!("user {} is not a gatherer, cannot start route {}", user.id, route.id);
        return Err(EngineError::WrongUserType);
    }
    if !route.is_assigned_to(&user.id) {
        warn!("route {} belongs to {}, not {}", route.id, route.gatherer_id, user.id);
        return Err(EngineError::WrongGatherer);
    }

    if route.initiated_at.is_none() {
        routes.initiate(&route.id).await?;
        route.initiated_at = Some(time.now());
        route.status = RouteStatus::Initiated;
    } else {
        info!("route {} already initiated, skipping", route.id);
    }

    Ok(StartedRoute {
        assigned_route: ActiveRouteView::new(&route, time),
    })
}
