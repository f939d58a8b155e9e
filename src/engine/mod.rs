//! Request-level protocol for the route lifecycle: validation, authorization,
//! idempotency and response shaping on top of the route repository.
//!
//! Every operation runs its checks in a fixed order and stops at the first
//! failure. Nothing written by an earlier step is rolled back.

pub mod assign;
pub mod finish_stop;
pub mod listing;
pub mod pin;
pub mod start;
pub mod views;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::ScheduleConfig;
use crate::services::{LocationDirectory, RepositoryError, RouteRepository, TimeService, UserDirectory};

use views::{AssignedRoutes, RouteListing, RouteProgress, ShiftListing, StartedRoute, UserScore};

/// Outcome class a caller can act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadInput,
    NotFound,
    Forbidden,
    Conflict,
    Unprocessable,
    Internal,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0} cannot be empty")]
    MissingField(&'static str),

    #[error("user not found")]
    UserNotFound(String),

    #[error("route not found")]
    RouteNotFound(String),

    #[error("shift not found")]
    ShiftNotFound(String),

    #[error("location not found")]
    LocationNotFound(String),

    #[error("user must be of type gatherer")]
    WrongUserType,

    #[error("the route is not assigned to the given gatherer id")]
    WrongGatherer,

    #[error("route already assigned")]
    RouteAlreadyAssigned(String),

    #[error("the shift has been closed and it's not receiving more picking_points")]
    ShiftClosed(String),

    #[error("given picking point does not exist in route")]
    StopNotInRoute(String),

    #[error("one or more materials are not allowed")]
    MaterialNotAllowed(String),

    #[error("dependency failure: {0}")]
    Dependency(RepositoryError),
}

impl EngineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            EngineError::MissingField(_) => ErrorClass::BadInput,
            EngineError::UserNotFound(_)
            | EngineError::RouteNotFound(_)
            | EngineError::ShiftNotFound(_)
            | EngineError::LocationNotFound(_) => ErrorClass::NotFound,
            EngineError::WrongUserType | EngineError::WrongGatherer => ErrorClass::Forbidden,
            EngineError::RouteAlreadyAssigned(_) | EngineError::ShiftClosed(_) => ErrorClass::Conflict,
            EngineError::StopNotInRoute(_) | EngineError::MaterialNotAllowed(_) => ErrorClass::Unprocessable,
            EngineError::Dependency(_) => ErrorClass::Internal,
        }
    }
}

impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::RouteNotFound(id) => EngineError::RouteNotFound(id),
            RepositoryError::UserNotFound(id) => EngineError::UserNotFound(id),
            RepositoryError::LocationNotFound(id) => EngineError::LocationNotFound(id),
            RepositoryError::RouteAlreadyAssigned(id) => EngineError::RouteAlreadyAssigned(id),
            other => EngineError::Dependency(other),
        }
    }
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        return Err(EngineError::MissingField(field));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignRouteRequest {
    pub user_id: String,
    pub route_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StartRouteRequest {
    pub user_id: String,
    pub route_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinishStopRequest {
    pub user_id: String,
    pub route_id: String,
    pub picking_point_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PinStopRequest {
    pub user_id: String,
    pub shift_id: String,
    pub location_id: String,
    pub materials: Vec<String>,
}

/// Listing windows measured from the current time
#[derive(Debug, Clone, Copy)]
pub struct ListingWindows {
    pub available_routes: Duration,
    pub open_shifts: Duration,
}

impl From<&ScheduleConfig> for ListingWindows {
    fn from(schedule: &ScheduleConfig) -> Self {
        Self {
            available_routes: Duration::hours(schedule.hours_offset),
            open_shifts: Duration::days(schedule.days_offset),
        }
    }
}

/// The engine bound to concrete collaborators, as used by the HTTP layer
#[derive(Clone)]
pub struct Engine {
    routes: Arc<dyn RouteRepository>,
    users: Arc<dyn UserDirectory>,
    locations: Arc<dyn LocationDirectory>,
    time: TimeService,
    windows: ListingWindows,
}

impl Engine {
    pub fn new(
        routes: Arc<dyn RouteRepository>,
        users: Arc<dyn UserDirectory>,
        locations: Arc<dyn LocationDirectory>,
        time: TimeService,
        windows: ListingWindows,
    ) -> Self {
        Self {
            routes,
            users,
            locations,
            time,
            windows,
        }
    }

    pub fn time(&self) -> &TimeService {
        &self.time
    }

    pub async fn assign_route(&self, request: &AssignRouteRequest) -> Result<(), EngineError> {
        assign::assign_route(self.users.as_ref(), self.routes.as_ref(), request).await
    }

    pub async fn start_route(&self, request: &StartRouteRequest) -> Result<StartedRoute, EngineError> {
        start::start_route(self.users.as_ref(), self.routes.as_ref(), &self.time, request).await
    }

    pub async fn finish_stop(&self, request: &FinishStopRequest) -> Result<RouteProgress, EngineError> {
        finish_stop::finish_stop(self.users.as_ref(), self.routes.as_ref(), &self.time, request).await
    }

    pub async fn pin_stop(&self, request: &PinStopRequest) -> Result<(), EngineError> {
        pin::pin_stop(
            self.users.as_ref(),
            self.routes.as_ref(),
            self.locations.as_ref(),
            request,
        )
        .await
    }

    pub async fn available_routes(&self) -> Result<RouteListing, EngineError> {
        let now = self.time.now();
        listing::available_routes(self.routes.as_ref(), &self.time, now, now + self.windows.available_routes).await
    }

    pub async fn open_shifts(&self) -> Result<ShiftListing, EngineError> {
        let now = self.time.now();
        listing::open_shifts(self.routes.as_ref(), &self.time, now, now + self.windows.open_shifts).await
    }

    pub async fn assigned_routes(&self, user_id: &str) -> Result<AssignedRoutes, EngineError> {
        listing::assigned_routes(self.users.as_ref(), self.routes.as_ref(), &self.time, user_id).await
    }

    pub async fn user_score(&self, user_id: &str) -> Result<UserScore, EngineError> {
        listing::user_score(self.users.as_ref(), self.locations.as_ref(), user_id).await
    }
}
