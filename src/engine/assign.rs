use tracing::{info, warn};

use crate::engine::{require, AssignRouteRequest, EngineError};
use crate::services::{RouteAssigner, RouteFinder, UserDirectory};

/// Bind a gatherer to a route. Re-submitting for the route's current gatherer succeeds
/// without writing; any other gatherer loses to the first one stored.
pub async fn assign_route<U, R>(users: &U, routes: &R, request: &AssignRouteRequest) -> Result<(), EngineError>
where
    U: UserDirectory + ?Sized,
    R: RouteFinder + RouteAssigner + ?Sized,
{
    require("user_id", &request.user_id)?;
    require("route_id", &request.route_id)?;

    let user = users.find_user(&request.user_id).await?;
    if !user.is_gatherer() {
        warn!("user {} is not a gatherer, cannot take route {}", user.id, request.route_id);
        return Err(EngineError::WrongUserType);
    }

    let route = routes.find(&request.route_id).await?;
    if route.gatherer_id == user.id {
        info!("route {} already held by {}, nothing to do", route.id, user.id);
        return Ok(());
    }

    routes.assign(&user.id, &route.id).await?;
    Ok(())
}
