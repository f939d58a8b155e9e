use tracing::{info, warn};

use crate::engine::{require, EngineError, PinStopRequest};
use crate::models::RouteStatus;
use crate::services::{LocationDirectory, RepositoryError, RouteFinder, StopPinner, UserDirectory};

/// Pin a requester's location onto an open shift. A location already on the route
/// succeeds without adding a second stop.
pub async fn pin_stop<U, R, L>(users: &U, routes: &R, locations: &L, request: &PinStopRequest) -> Result<(), EngineError>
where
    U: UserDirectory + ?Sized,
    R: RouteFinder + StopPinner + ?Sized,
    L: LocationDirectory + ?Sized,
{
    require("user_id", &request.user_id)?;
    require("shift_id", &request.shift_id)?;
    require("location_id", &request.location_id)?;
    let materials = clean_materials(&request.materials)?;

    let user = users.find_user(&request.user_id).await?;
    let route = routes.find(&request.shift_id).await.map_err(|err| match err {
        RepositoryError::RouteNotFound(id) => EngineError::ShiftNotFound(id),
        other => other.into(),
    })?;

    if let Some(rejected) = materials.iter().find(|material| !route.accepts_material(material)) {
        warn!("material {} not accepted by shift {}", rejected, route.id);
        return Err(EngineError::MaterialNotAllowed(rejected.clone()));
    }
    if route.status != RouteStatus::Open {
        warn!("shift {} is {}, not accepting stops", route.id, route.status);
        return Err(EngineError::ShiftClosed(route.id));
    }

    let location = locations.find_location(&request.location_id).await?;
    if route.stop_for_location(&location.id).is_some() {
        info!("location {} already pinned on shift {}", location.id, route.id);
        return Ok(());
    }

    routes.pin(&user.id, &location, &route.id, &materials).await?;
    Ok(())
}

fn clean_materials(raw: &[String]) -> Result<Vec<String>, EngineError> {
    if raw.is_empty() {
        return Err(EngineError::MissingField("materials"));
    }
    raw.iter()
        .map(|material| {
            let material = material.trim();
            if material.is_empty() {
                Err(EngineError::MissingField("materials"))
            } else {
                Ok(material.to_string())
            }
        })
        .collect()
}
