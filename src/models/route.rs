use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::database::record::{Record, RecordError};
use crate::database::store::Item;
use crate::services::time::TimeService;

/// Reserved gatherer reference of a route nobody has claimed yet
pub const UNASSIGNED: &str = "unassigned";

/// Persisted attribute names of a route record
pub mod fields {
    pub const ID: &str = "id";
    pub const SECTOR: &str = "sector";
    pub const SHIFT: &str = "shift";
    pub const MATERIALS: &str = "materials";
    pub const STATUS: &str = "status";
    pub const GATHERER_ID: &str = "gatherer_id";
    pub const STARTS_AT: &str = "starts_at";
    pub const INITIATED_AT: &str = "initiated_at";
    pub const FINISHED_AT: &str = "finished_at";
    pub const CREATED_AT: &str = "created_at";
    pub const REMAINING: &str = "remaining";
    pub const PICKING_POINTS: &str = "picking_points";
    pub const PICKED_AT: &str = "picked_at";
}

pub mod materials {
    pub const PLASTIC: &str = "plastic";
    pub const METAL: &str = "metal";
    pub const GLASS: &str = "glass";
    pub const PAPER: &str = "paper";
    pub const TECHNOLOGY: &str = "technology";

    pub const ALL: [&str; 5] = [PLASTIC, METAL, GLASS, PAPER, TECHNOLOGY];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    Open,
    Closed,
    Assigned,
    Initiated,
    Finished,
    Cancelled,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Open => "open",
            RouteStatus::Closed => "closed",
            RouteStatus::Assigned => "assigned",
            RouteStatus::Initiated => "initiated",
            RouteStatus::Finished => "finished",
            RouteStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(RouteStatus::Open),
            "closed" => Some(RouteStatus::Closed),
            "assigned" => Some(RouteStatus::Assigned),
            "initiated" => Some(RouteStatus::Initiated),
            "finished" => Some(RouteStatus::Finished),
            "cancelled" => Some(RouteStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A picking point: one location visited as part of a route, with the address
/// captured when it was pinned
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: String,
    pub location_id: String,
    pub country: String,
    pub city: String,
    pub state: String,
    pub address_1: String,
    pub address_2: String,
    pub latitude: f64,
    pub longitude: f64,
    pub materials: Vec<String>,
    pub pinned_by: String,
    pub picked_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Stop {
    pub fn is_picked(&self) -> bool {
        self.picked_at.is_some()
    }

    pub fn from_record(record: &Record, time: &TimeService) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.required_str("id")?,
            location_id: record.str_or_default("location_id"),
            country: record.str_or_default("country"),
            city: record.str_or_default("city"),
            state: record.str_or_default("state"),
            address_1: record.str_or_default("address_1"),
            address_2: record.str_or_default("address_2"),
            latitude: record.f64_or_default("latitude"),
            longitude: record.f64_or_default("longitude"),
            materials: record.string_list("materials"),
            pinned_by: record.str_or_default("pinned_by"),
            picked_at: record.timestamp(fields::PICKED_AT, time)?,
            created_at: record.timestamp(fields::CREATED_AT, time)?,
        })
    }

    pub fn to_value(&self, time: &TimeService) -> Value {
        json!({
            "id": self.id,
            "location_id": self.location_id,
            "country": self.country,
            "city": self.city,
            "state": self.state,
            "address_1": self.address_1,
            "address_2": self.address_2,
            "latitude": self.latitude,
            "longitude": self.longitude,
            "materials": self.materials,
            "pinned_by": self.pinned_by,
            "picked_at": self.picked_at.map(|at| time.to_iso8601(&at)),
            "created_at": self.created_at.map(|at| time.to_iso8601(&at)),
        })
    }
}

/// One scheduled collection shift and its ordered stops
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: String,
    pub sector: String,
    pub shift: String,
    pub materials: Vec<String>,
    pub status: RouteStatus,
    pub gatherer_id: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub initiated_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub remaining: Option<i64>,
    pub picking_points: Vec<Stop>,
}

impl Route {
    /// Identity, status and the gatherer reference are mandatory; everything else falls
    /// back to its zero value. Unclaimed routes carry the `unassigned` sentinel, which is
    /// what the listing query and the assign guard compare against.
    pub fn from_record(record: &Record, time: &TimeService) -> Result<Self, RecordError> {
        let raw_status = record.required_str(fields::STATUS)?;
        let status = RouteStatus::parse(&raw_status).ok_or_else(|| RecordError::InvalidField {
            field: fields::STATUS.to_string(),
            expected: "route status",
        })?;

        let picking_points = record
            .records(fields::PICKING_POINTS)
            .iter()
            .map(|stop| Stop::from_record(stop, time))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: record.required_str(fields::ID)?,
            sector: record.str_or_default(fields::SECTOR),
            shift: record.str_or_default(fields::SHIFT),
            materials: record.string_list(fields::MATERIALS),
            status,
            gatherer_id: record.required_str(fields::GATHERER_ID)?,
            starts_at: record.timestamp(fields::STARTS_AT, time)?,
            initiated_at: record.timestamp(fields::INITIATED_AT, time)?,
            finished_at: record.timestamp(fields::FINISHED_AT, time)?,
            created_at: record.timestamp(fields::CREATED_AT, time)?,
            remaining: record.optional_i64(fields::REMAINING),
            picking_points,
        })
    }

    pub fn to_item(&self, time: &TimeService) -> Item {
        let mut record = Record::new();
        record
            .set(fields::ID, self.id.clone())
            .set(fields::SECTOR, self.sector.clone())
            .set(fields::SHIFT, self.shift.clone())
            .set(fields::MATERIALS, json!(self.materials))
            .set(fields::STATUS, self.status.as_str())
            .set(fields::GATHERER_ID, self.gatherer_id.clone())
            .set(fields::STARTS_AT, json!(self.starts_at.map(|at| time.to_iso8601(&at))))
            .set(fields::INITIATED_AT, json!(self.initiated_at.map(|at| time.to_iso8601(&at))))
            .set(fields::FINISHED_AT, json!(self.finished_at.map(|at| time.to_iso8601(&at))))
            .set(fields::CREATED_AT, json!(self.created_at.map(|at| time.to_iso8601(&at))))
            .set(
                fields::PICKING_POINTS,
                Value::Array(self.picking_points.iter().map(|stop| stop.to_value(time)).collect()),
            );
        if let Some(remaining) = self.remaining {
            record.set(fields::REMAINING, remaining);
        }
        record.into_item()
    }

    pub fn is_unassigned(&self) -> bool {
        self.gatherer_id == UNASSIGNED
    }

    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        !self.is_unassigned() && self.gatherer_id == user_id
    }

    pub fn accepts_material(&self, material: &str) -> bool {
        self.materials.iter().any(|accepted| accepted == material)
    }

    pub fn stop_for_location(&self, location_id: &str) -> Option<&Stop> {
        self.picking_points.iter().find(|stop| stop.location_id == location_id)
    }

    pub fn unpicked_stops(&self) -> impl Iterator<Item = &Stop> {
        self.picking_points.iter().filter(|stop| !stop.is_picked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn time() -> TimeService {
        TimeService::new("America/Argentina/Buenos_Aires").unwrap()
    }

    fn route_record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn status_names_round_trip() {
        for status in [
            RouteStatus::Open,
            RouteStatus::Closed,
            RouteStatus::Assigned,
            RouteStatus::Initiated,
            RouteStatus::Finished,
            RouteStatus::Cancelled,
        ] {
            assert_eq!(RouteStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RouteStatus::parse("OPEN"), None);
        assert_eq!(serde_json::to_value(RouteStatus::Initiated).unwrap(), "initiated");
    }

    #[test]
    fn hydrates_route_with_defaults() {
        let record = route_record(json!({
            "id": "r1",
            "status": "closed",
            "gatherer_id": "unassigned",
            "materials": ["glass", "paper"],
            "starts_at": "2024-03-01T12:00:00-0300",
            "picking_points": [
                {"id": "s1", "location_id": "l1", "latitude": -34.6, "picked_at": null},
                {"id": "s2", "location_id": "l2", "picked_at": "2024-03-01T13:00:00-0300"}
            ]
        }));

        let route = Route::from_record(&record, &time()).unwrap();
        assert_eq!(route.gatherer_id, UNASSIGNED);
        assert!(route.is_unassigned());
        assert_eq!(route.sector, "");
        assert_eq!(route.starts_at, Some(Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap()));
        assert!(route.initiated_at.is_none());
        assert_eq!(route.picking_points.len(), 2);
        assert!(!route.picking_points[0].is_picked());
        assert!(route.picking_points[1].is_picked());
        assert_eq!(route.unpicked_stops().count(), 1);
        assert!(route.stop_for_location("l2").is_some());
        assert!(route.accepts_material("glass"));
        assert!(!route.accepts_material("metal"));
    }

    #[test]
    fn rejects_records_without_identity_status_or_gatherer() {
        let no_id = route_record(json!({"status": "open"}));
        assert!(matches!(
            Route::from_record(&no_id, &time()),
            Err(RecordError::MissingRequiredField(_))
        ));

        let bad_status = route_record(json!({"id": "r1", "status": "paused"}));
        assert!(matches!(
            Route::from_record(&bad_status, &time()),
            Err(RecordError::InvalidField { .. })
        ));

        let no_gatherer = route_record(json!({"id": "r1", "status": "closed"}));
        assert!(matches!(
            Route::from_record(&no_gatherer, &time()),
            Err(RecordError::MissingRequiredField(field)) if field == "gatherer_id"
        ));

        let stop_without_id = route_record(json!({"id": "r1", "status": "open", "picking_points": [{"location_id": "l1"}]}));
        assert!(Route::from_record(&stop_without_id, &time()).is_err());
    }

    #[test]
    fn item_round_trips_through_record() {
        let time = time();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
        let route = Route {
            id: "r1".to_string(),
            sector: "north".to_string(),
            shift: "morning".to_string(),
            materials: vec!["glass".to_string()],
            status: RouteStatus::Assigned,
            gatherer_id: "g1".to_string(),
            starts_at: Some(at),
            initiated_at: None,
            finished_at: None,
            created_at: Some(at),
            remaining: None,
            picking_points: vec![],
        };

        let item = route.to_item(&time);
        assert_eq!(item["starts_at"], "2024-03-01T12:00:00-0300");
        assert_eq!(item["initiated_at"], Value::Null);
        let back = Route::from_record(&Record::from_item(item), &time).unwrap();
        assert_eq!(back, route);
        assert!(back.is_assigned_to("g1"));
        assert!(!back.is_assigned_to("g2"));
    }
}
