use serde::Serialize;

use crate::models::{Route, RouteStatus, Stop};
use crate::services::TimeService;

/// Stop as shown to the gatherer working a route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveStopView {
    pub country: String,
    pub city: String,
    pub address_1: String,
    pub address_2: String,
    pub location_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub materials: Vec<String>,
}

impl From<&Stop> for ActiveStopView {
    fn from(stop: &Stop) -> Self {
        Self {
            country: stop.country.clone(),
            city: stop.city.clone(),
            address_1: stop.address_1.clone(),
            address_2: stop.address_2.clone(),
            location_id: stop.location_id.clone(),
            latitude: stop.latitude,
            longitude: stop.longitude,
            materials: stop.materials.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopView {
    pub id: String,
    pub location_id: String,
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address_1: String,
    pub address_2: String,
    pub materials: Vec<String>,
}

impl From<&Stop> for StopView {
    fn from(stop: &Stop) -> Self {
        Self {
            id: stop.id.clone(),
            location_id: stop.location_id.clone(),
            country: stop.country.clone(),
            city: stop.city.clone(),
            latitude: stop.latitude,
            longitude: stop.longitude,
            address_1: stop.address_1.clone(),
            address_2: stop.address_2.clone(),
            materials: stop.materials.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveRouteView {
    pub id: String,
    pub materials: Vec<String>,
    pub sector: String,
    pub status: RouteStatus,
    pub shift: String,
    pub date: String,
    pub picking_points: Vec<ActiveStopView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartedRoute {
    pub assigned_route: ActiveRouteView,
}

/// Route after a stop completion: only pending stops are listed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteProgress {
    pub id: String,
    pub materials: Vec<String>,
    pub sector: String,
    pub status: RouteStatus,
    pub shift: String,
    pub date: String,
    pub picking_points: Vec<StopView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteView {
    pub id: String,
    pub materials: Vec<String>,
    pub sector: String,
    pub status: RouteStatus,
    pub shift: String,
    pub date: String,
    pub formatted_date: String,
    pub picking_points: Vec<StopView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftView {
    pub id: String,
    pub materials: Vec<String>,
    pub sector: String,
    pub shift: String,
    pub date: String,
    pub formatted_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteListing {
    pub routes: Vec<RouteView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftListing {
    pub shifts: Vec<ShiftView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedRoutes {
    pub assigned_routes: Vec<RouteView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserScore {
    pub username: String,
    pub score: f64,
}

fn date(route: &Route, time: &TimeService) -> String {
    route
        .starts_at
        .map(|at| time.to_iso8601(&at))
        .unwrap_or_default()
}

fn formatted_date(route: &Route, time: &TimeService) -> String {
    route
        .starts_at
        .map(|at| time.to_display_format(&at))
        .unwrap_or_default()
}

impl ActiveRouteView {
    pub fn new(route: &Route, time: &TimeService) -> Self {
        Self {
            id: route.id.clone(),
            materials: route.materials.clone(),
            sector: route.sector.clone(),
            status: route.status,
            shift: route.shift.clone(),
            date: date(route, time),
            picking_points: route.picking_points.iter().map(ActiveStopView::from).collect(),
        }
    }
}

impl RouteProgress {
    pub fn new(route: &Route, status: RouteStatus, time: &TimeService) -> Self {
        Self {
            id: route.id.clone(),
            materials: route.materials.clone(),
            sector: route.sector.clone(),
            status,
            shift: route.shift.clone(),
            date: date(route, time),
            picking_points: route.unpicked_stops().map(StopView::from).collect(),
        }
    }
}

impl RouteView {
    pub fn new(route: &Route, time: &TimeService) -> Self {
        Self {
            id: route.id.clone(),
            materials: route.materials.clone(),
            sector: route.sector.clone(),
            status: route.status,
            shift: route.shift.clone(),
            date: date(route, time),
            formatted_date: formatted_date(route, time),
            picking_points: route.picking_points.iter().map(StopView::from).collect(),
        }
    }
}

impl ShiftView {
    pub fn new(route: &Route, time: &TimeService) -> Self {
        Self {
            id: route.id.clone(),
            materials: route.materials.clone(),
            sector: route.sector.clone(),
            shift: route.shift.clone(),
            date: date(route, time),
            formatted_date: formatted_date(route, time),
        }
    }
}
