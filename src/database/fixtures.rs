//! YAML seed documents for users, locations and routes.
//!
//! ```yaml
//! users:
//!   - { id: g1, username: gatherer_one, type: gatherer }
//! locations:
//!   - { id: l1, created_by: u1, balance: 12.5, city: Rosario }
//! routes:
//!   - id: r1
//!     status: closed
//!     materials: [glass, paper]
//!     starts_in_hours: 4
//!     picking_points:
//!       - { id: s1, location_id: l1, materials: [glass] }
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::config::StoreConfig;
use crate::database::record::{Record, RecordError};
use crate::database::store::{Item, RecordStore, StoreError, KEY_FIELD};
use crate::models::route::fields;
use crate::models::{Route, UNASSIGNED};
use crate::services::TimeService;

/// Schedules a route relative to load time instead of a fixed `starts_at`
pub const STARTS_IN_HOURS: &str = "starts_in_hours";

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Cannot read fixtures file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid fixtures document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{section}[{index}] has no id")]
    MissingId { section: &'static str, index: usize },

    #[error("Route {id} is invalid: {source}")]
    InvalidRoute {
        id: String,
        #[source]
        source: RecordError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FixtureFile {
    pub users: Vec<Item>,
    pub locations: Vec<Item>,
    pub routes: Vec<Item>,
}

/// How many records of each kind were written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FixtureSummary {
    pub users: usize,
    pub locations: usize,
    pub routes: usize,
}

impl FixtureFile {
    pub fn parse(document: &str) -> Result<Self, FixtureError> {
        Ok(serde_yaml::from_str(document)?)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&document)
    }
}

/// Read `path` and write every record into `store`, overwriting records with the same id
pub async fn load(
    store: &dyn RecordStore,
    tables: &StoreConfig,
    time: &TimeService,
    path: impl AsRef<Path>,
) -> Result<FixtureSummary, FixtureError> {
    let file = FixtureFile::read(path.as_ref())?;
    let summary = seed(store, tables, time, file).await?;
    info!(
        "loaded fixtures from {}: {} users, {} locations, {} routes",
        path.as_ref().display(),
        summary.users,
        summary.locations,
        summary.routes
    );
    Ok(summary)
}

pub async fn seed(
    store: &dyn RecordStore,
    tables: &StoreConfig,
    time: &TimeService,
    file: FixtureFile,
) -> Result<FixtureSummary, FixtureError> {
    // validate everything before the first write
    check_ids("users", &file.users)?;
    check_ids("locations", &file.locations)?;
    check_ids("routes", &file.routes)?;
    let routes = file
        .routes
        .into_iter()
        .map(|item| prepare_route(item, time))
        .collect::<Result<Vec<_>, _>>()?;

    let summary = FixtureSummary {
        users: file.users.len(),
        locations: file.locations.len(),
        routes: routes.len(),
    };

    for user in file.users {
        store.put(&tables.users_table, user).await?;
    }
    for location in file.locations {
        store.put(&tables.locations_table, location).await?;
    }
    for route in routes {
        store.put(&tables.routes_table, route).await?;
    }
    Ok(summary)
}

fn check_ids(section: &'static str, items: &[Item]) -> Result<(), FixtureError> {
    for (index, item) in items.iter().enumerate() {
        match item.get(KEY_FIELD).and_then(Value::as_str) {
            Some(id) if !id.is_empty() => {}
            _ => return Err(FixtureError::MissingId { section, index }),
        }
    }
    Ok(())
}

/// Fill in the attributes a stored route must always carry
fn prepare_route(mut item: Item, time: &TimeService) -> Result<Item, FixtureError> {
    if let Some(hours) = item.remove(STARTS_IN_HOURS).and_then(|v| v.as_f64()) {
        let starts_at = time.now() + Duration::seconds((hours * 3600.0) as i64);
        item.insert(fields::STARTS_AT.to_string(), Value::String(time.to_iso8601(&starts_at)));
    }
    let unassigned = item
        .get(fields::GATHERER_ID)
        .and_then(Value::as_str)
        .map_or(true, str::is_empty);
    if unassigned {
        item.insert(fields::GATHERER_ID.to_string(), Value::String(UNASSIGNED.to_string()));
    }
    item.entry(fields::PICKING_POINTS.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));

    let id = item.get(KEY_FIELD).and_then(Value::as_str).unwrap_or_default().to_string();
    let route = Route::from_record(&Record::from_item(item), time)
        .map_err(|source| FixtureError::InvalidRoute { id, source })?;
    Ok(route.to_item(time))
}
