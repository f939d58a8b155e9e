use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::engine::views::{AssignedRoutes, RouteListing, RouteView, ShiftListing, ShiftView, UserScore};
use crate::engine::{require, EngineError};
use crate::services::{LocationDirectory, RouteLister, TimeService, UserDirectory};

/// Unclaimed closed routes starting inside the window
pub async fn available_routes<R>(
    routes: &R,
    time: &TimeService,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<RouteListing, EngineError>
where
    R: RouteLister + ?Sized,
{
    let found = routes.find_available(from, to).await?;
    debug!("{} available routes", found.len());
    Ok(RouteListing {
        routes: found.iter().map(|route| RouteView::new(route, time)).collect(),
    })
}

/// Shifts still accepting stops, starting inside the window
pub async fn open_shifts<R>(
    routes: &R,
    time: &TimeService,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<ShiftListing, EngineError>
where
    R: RouteLister + ?Sized,
{
    let found = routes.find_open_shifts(from, to).await?;
    debug!("{} open shifts", found.len());
    Ok(ShiftListing {
        shifts: found.iter().map(|route| ShiftView::new(route, time)).collect(),
    })
}

pub async fn assigned_routes<U, R>(
    users: &U,
    routes: &R,
    time: &TimeService,
    user_id: &str,
) -> Result<AssignedRoutes, EngineError>
where
    U: UserDirectory + ?Sized,
    R: RouteLister + ?Sized,
{
    require("user_id", user_id)?;
    let user = users.find_user(user_id).await?;
    if !user.is_gatherer() {
        warn!("user {} is not a gatherer, has no assigned routes", user.id);
        return Err(EngineError::WrongUserType);
    }

    let found = routes.find_assigned_to_gatherer(&user.id).await?;
    Ok(AssignedRoutes {
        assigned_routes: found.iter().map(|route| RouteView::new(route, time)).collect(),
    })
}

/// Sum of the balances of every location the user registered
pub async fn user_score<U, L>(users: &U, locations: &L, user_id: &str) -> Result<UserScore, EngineError>
where
    U: UserDirectory + ?Sized,
    L: LocationDirectory + ?Sized,
{
    require("user_id", user_id)?;
    let user = users.find_user(user_id).await?;
    let owned = locations.find_by_owner(&user.id).await?;

    Ok(UserScore {
        username: user.username,
        score: owned.iter().map(|location| location.balance).sum(),
    })
}
