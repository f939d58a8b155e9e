use tracing::{info, warn};

use crate::engine::views::RouteProgress;
use crate::engine::{require, EngineError, FinishStopRequest};
use crate::models::{Route, RouteStatus};
use crate::services::{RouteFinder, StopFinisher, TimeService, UserDirectory};

/// Where the target stop sits in the route and how much work is left
struct StopScan {
    index: usize,
    location_id: String,
    already_picked: bool,
    unpicked: usize,
}

/// Mark one stop as picked and report the stops still pending.
///
/// Picking an already picked stop writes nothing and reports the same pending count.
/// The route presents as finished once no stop is left, but that status is never stored.
pub async fn finish_stop<U, R>(
    users: &U,
    routes: &R,
    time: &TimeService,
    request: &FinishStopRequest,
) -> Result<RouteProgress, EngineError>
where
    U: UserDirectory + ?Sized,
    R: RouteFinder + StopFinisher + ?Sized,
{
    require("user_id", &request.user_id)?;
    require("route_id", &request.route_id)?;
    require("picking_point_id", &request.picking_point_id)?;

    let user = users.find_user(&request.user_id).await?;
    if !user.is_gatherer() {
        warn!("user {} is not a gatherer, cannot finish stops", user.id);
        return Err(EngineError::WrongUserType);
    }

    let mut route = routes.find(&request.route_id).await?;
    if !route.is_assigned_to(&user.id) {
        warn!("route {} belongs to {}, not {}", route.id, route.gatherer_id, user.id);
        return Err(EngineError::WrongGatherer);
    }

    let scan = match scan_stops(&route, &request.picking_point_id) {
        Some(scan) => scan,
        None => {
            warn!("stop {} is not part of route {}", request.picking_point_id, route.id);
            return Err(EngineError::StopNotInRoute(request.picking_point_id.clone()));
        }
    };

    let remaining = if scan.already_picked {
        info!("stop {} on route {} already picked", request.picking_point_id, route.id);
        scan.unpicked
    } else {
        scan.unpicked - 1
    };

    if !scan.already_picked {
        routes
            .finish_stop(&route.id, scan.index, &scan.location_id, remaining)
            .await?;
        route.picking_points[scan.index].picked_at = Some(time.now());
        route.remaining = Some(remaining as i64);
    }

    let status = if remaining == 0 {
        RouteStatus::Finished
    } else {
        route.status
    };
    Ok(RouteProgress::new(&route, status, time))
}

/// Single pass over the stops. `unpicked` reflects the state before this call.
fn scan_stops(route: &Route, stop_id: &str) -> Option<StopScan> {
    let mut target = None;
    let mut unpicked = 0;
    for (index, stop) in route.picking_points.iter().enumerate() {
        if !stop.is_picked() {
            unpicked += 1;
        }
        if target.is_none() && stop.id == stop_id {
            target = Some((index, stop.location_id.clone(), stop.is_picked()));
        }
    }
    target.map(|(index, location_id, already_picked)| StopScan {
        index,
        location_id,
        already_picked,
        unpicked,
    })
}
