use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::database::record::Record;
use crate::database::store::{Condition, FieldPath, Item, RecordQuery, RecordStore, StoreError, Update};
use crate::models::route::fields;
use crate::models::{Location, Route, RouteStatus, Stop, UNASSIGNED};
use crate::services::ids::IdGenerator;
use crate::services::time::TimeService;
use crate::services::RepositoryError;

#[async_trait]
pub trait RouteFinder: Send + Sync {
    async fn find(&self, route_id: &str) -> Result<Route, RepositoryError>;
}

#[async_trait]
pub trait RouteLister: Send + Sync {
    /// Closed, unclaimed routes starting inside `[from, to]`
    async fn find_available(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Route>, RepositoryError>;

    /// Open routes starting inside `[from, to]`
    async fn find_open_shifts(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Route>, RepositoryError>;

    async fn find_assigned_to_gatherer(&self, gatherer_id: &str) -> Result<Vec<Route>, RepositoryError>;
}

#[async_trait]
pub trait RouteAssigner: Send + Sync {
    /// Bind `user_id` to the route only if nobody holds it at write time.
    /// Losing the race yields `RouteAlreadyAssigned`.
    async fn assign(&self, user_id: &str, route_id: &str) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait RouteInitiator: Send + Sync {
    /// Unconditional; callers guard against initiating twice
    async fn initiate(&self, route_id: &str) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait StopPinner: Send + Sync {
    async fn pin(
        &self,
        user_id: &str,
        location: &Location,
        route_id: &str,
        materials: &[String],
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait StopFinisher: Send + Sync {
    /// Stamp the stop at `stop_index` as picked and record how many stops are still pending
    async fn finish_stop(
        &self,
        route_id: &str,
        stop_index: usize,
        location_id: &str,
        remaining: usize,
    ) -> Result<(), RepositoryError>;
}

/// Every route capability behind one object
pub trait RouteRepository:
    RouteFinder + RouteLister + RouteAssigner + RouteInitiator + StopPinner + StopFinisher
{
}

impl<T> RouteRepository for T where
    T: RouteFinder + RouteLister + RouteAssigner + RouteInitiator + StopPinner + StopFinisher
{
}

/// Route repository over a record store. Routes are single records with their stops embedded;
/// queries rely on the (status, starts_at) and (gatherer_id, status) indexes.
pub struct StoreRouteRepository {
    store: Arc<dyn RecordStore>,
    table: String,
    time: TimeService,
    ids: Arc<dyn IdGenerator>,
}

impl StoreRouteRepository {
    pub fn new(
        store: Arc<dyn RecordStore>,
        table: impl Into<String>,
        time: TimeService,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            time,
            ids,
        }
    }

    fn hydrate(&self, item: Item) -> Result<Route, RepositoryError> {
        Route::from_record(&Record::from_item(item), &self.time).map_err(RepositoryError::malformed(&self.table))
    }

    async fn query(&self, query: RecordQuery) -> Result<Vec<Route>, RepositoryError> {
        let items = self.store.query(&self.table, &query).await?;
        items.into_iter().map(|item| self.hydrate(item)).collect()
    }

    fn route_error(&self, route_id: &str, err: StoreError) -> RepositoryError {
        match err {
            StoreError::NotFound { .. } => RepositoryError::RouteNotFound(route_id.to_string()),
            other => RepositoryError::Store(other),
        }
    }
}

#[async_trait]
impl RouteFinder for StoreRouteRepository {
    async fn find(&self, route_id: &str) -> Result<Route, RepositoryError> {
        match self.store.get(&self.table, route_id).await? {
            Some(item) => self.hydrate(item),
            None => Err(RepositoryError::RouteNotFound(route_id.to_string())),
        }
    }
}

#[async_trait]
impl RouteLister for StoreRouteRepository {
    async fn find_available(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Route>, RepositoryError> {
        debug!("querying available routes between {} and {}", from, to);
        self.query(
            RecordQuery::new()
                .where_eq(fields::STATUS, RouteStatus::Closed.as_str())
                .where_eq(fields::GATHERER_ID, UNASSIGNED)
                .between(fields::STARTS_AT, from, to),
        )
        .await
    }

    async fn find_open_shifts(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Route>, RepositoryError> {
        debug!("querying open shifts between {} and {}", from, to);
        self.query(
            RecordQuery::new()
                .where_eq(fields::STATUS, RouteStatus::Open.as_str())
                .between(fields::STARTS_AT, from, to),
        )
        .await
    }

    async fn find_assigned_to_gatherer(&self, gatherer_id: &str) -> Result<Vec<Route>, RepositoryError> {
        self.query(
            RecordQuery::new()
                .where_eq(fields::GATHERER_ID, gatherer_id)
                .where_eq(fields::STATUS, RouteStatus::Assigned.as_str()),
        )
        .await
    }
}

#[async_trait]
impl RouteAssigner for StoreRouteRepository {
    async fn assign(&self, user_id: &str, route_id: &str) -> Result<(), RepositoryError> {
        let update = Update::new()
            .set(FieldPath::key(fields::GATHERER_ID), user_id)
            .set(FieldPath::key(fields::STATUS), RouteStatus::Assigned.as_str())
            .when(Condition::equals(fields::GATHERER_ID, UNASSIGNED));

        match self.store.update(&self.table, route_id, update).await {
            Ok(()) => {
                info!("route {} assigned to gatherer {}", route_id, user_id);
                Ok(())
            }
            Err(StoreError::ConditionFailed { .. }) => {
                warn!("route {} already assigned, rejecting gatherer {}", route_id, user_id);
                Err(RepositoryError::RouteAlreadyAssigned(route_id.to_string()))
            }
            Err(err) => Err(self.route_error(route_id, err)),
        }
    }
}

#[async_trait]
impl RouteInitiator for StoreRouteRepository {
    async fn initiate(&self, route_id: &str) -> Result<(), RepositoryError> {
        let now = self.time.to_iso8601(&self.time.now());
        let update = Update::new()
            .set(FieldPath::key(fields::INITIATED_AT), now)
            .set(FieldPath::key(fields::STATUS), RouteStatus::Initiated.as_str());

        self.store
            .update(&self.table, route_id, update)
            .await
            .map_err(|err| self.route_error(route_id, err))?;
        info!("route {} initiated", route_id);
        Ok(())
    }
}

#[async_trait]
impl StopPinner for StoreRouteRepository {
    // Read-modify-write of the whole stop list: two concurrent pins on one route can
    // lose one of the stops.
    async fn pin(
        &self,
        user_id: &str,
        location: &Location,
        route_id: &str,
        materials: &[String],
    ) -> Result<(), RepositoryError> {
        let route = self.find(route_id).await?;

        let stop = Stop {
            id: self.ids.generate(),
            location_id: location.id.clone(),
            country: location.country.clone(),
            city: location.city.clone(),
            state: location.state.clone(),
            address_1: location.address_1.clone(),
            address_2: location.address_2.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            materials: materials.to_vec(),
            pinned_by: user_id.to_string(),
            picked_at: None,
            created_at: Some(self.time.now()),
        };

        let mut stops: Vec<Value> = route
            .picking_points
            .iter()
            .map(|existing| existing.to_value(&self.time))
            .collect();
        stops.push(stop.to_value(&self.time));

        let update = Update::new().set(FieldPath::key(fields::PICKING_POINTS), Value::Array(stops));
        self.store
            .update(&self.table, route_id, update)
            .await
            .map_err(|err| self.route_error(route_id, err))?;

        info!("location {} pinned on route {} as stop {}", location.id, route_id, stop.id);
        Ok(())
    }
}

#[async_trait]
impl StopFinisher for StoreRouteRepository {
    // Unguarded like pin: concurrent finishes on one route may persist a stale count.
    async fn finish_stop(
        &self,
        route_id: &str,
        stop_index: usize,
        location_id: &str,
        remaining: usize,
    ) -> Result<(), RepositoryError> {
        let picked_at = self.time.to_iso8601(&self.time.now());
        let path = FieldPath::key(fields::PICKING_POINTS)
            .then_index(stop_index)
            .then_key(fields::PICKED_AT);
        let update = Update::new()
            .set(path, picked_at)
            .set(FieldPath::key(fields::REMAINING), remaining as u64);

        self.store
            .update(&self.table, route_id, update)
            .await
            .map_err(|err| self.route_error(route_id, err))?;

        info!(
            "stop {} (location {}) picked on route {}, {} remaining",
            stop_index, location_id, route_id, remaining
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RouteSeed, TestContext};
    use chrono::Duration;

    #[tokio::test]
    async fn find_unknown_route_is_not_found() {
        let ctx = TestContext::new();
        let err = ctx.routes.find("missing").await.unwrap_err();
        assert!(matches!(err, RepositoryError::RouteNotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn find_rejects_malformed_record() {
        let ctx = TestContext::new();
        ctx.put_raw_route(serde_json::json!({
            "id": "r1",
            "status": "open",
            "gatherer_id": "unassigned",
            "starts_at": "tomorrow"
        }))
        .await;
        let err = ctx.routes.find("r1").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Malformed { .. }));
    }

    #[tokio::test]
    async fn route_without_gatherer_reference_is_malformed() {
        let ctx = TestContext::new();
        let starts_at = ctx.time.to_iso8601(&(ctx.time.now() + Duration::hours(1)));
        ctx.put_raw_route(serde_json::json!({"id": "r1", "status": "closed", "starts_at": starts_at}))
            .await;

        let err = ctx.routes.find("r1").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Malformed { .. }));

        let now = ctx.time.now();
        let listed = ctx.routes.find_available(now, now + Duration::hours(24)).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn assign_is_conditional_on_unassigned_gatherer() {
        let ctx = TestContext::new();
        ctx.seed_route(RouteSeed::closed("r1")).await;

        ctx.routes.assign("g1", "r1").await.unwrap();
        let route = ctx.routes.find("r1").await.unwrap();
        assert_eq!(route.gatherer_id, "g1");
        assert_eq!(route.status, RouteStatus::Assigned);

        let err = ctx.routes.assign("g2", "r1").await.unwrap_err();
        assert!(matches!(err, RepositoryError::RouteAlreadyAssigned(_)));
        assert_eq!(ctx.routes.find("r1").await.unwrap().gatherer_id, "g1");

        let err = ctx.routes.assign("g1", "nope").await.unwrap_err();
        assert!(matches!(err, RepositoryError::RouteNotFound(_)));
    }

    #[tokio::test]
    async fn initiate_sets_timestamp_and_status() {
        let ctx = TestContext::new();
        ctx.seed_route(RouteSeed::closed("r1").assigned_to("g1")).await;

        ctx.routes.initiate("r1").await.unwrap();
        let route = ctx.routes.find("r1").await.unwrap();
        assert_eq!(route.status, RouteStatus::Initiated);
        assert!(route.initiated_at.is_some());
    }

    #[tokio::test]
    async fn pin_appends_snapshot_stop() {
        let ctx = TestContext::new();
        ctx.seed_route(RouteSeed::open("r1").with_stop("s0", "l0")).await;
        let location = ctx.seed_location("l1", "u1", 10.0).await;

        ctx.routes
            .pin("u1", &location, "r1", &["glass".to_string()])
            .await
            .unwrap();

        let route = ctx.routes.find("r1").await.unwrap();
        assert_eq!(route.picking_points.len(), 2);
        let stop = &route.picking_points[1];
        assert_eq!(stop.id, "id-1");
        assert_eq!(stop.location_id, "l1");
        assert_eq!(stop.city, location.city);
        assert_eq!(stop.materials, vec!["glass"]);
        assert_eq!(stop.pinned_by, "u1");
        assert!(stop.picked_at.is_none());
        assert!(stop.created_at.is_some());
    }

    #[tokio::test]
    async fn finish_stop_marks_index_and_remaining() {
        let ctx = TestContext::new();
        ctx.seed_route(
            RouteSeed::closed("r1")
                .assigned_to("g1")
                .with_stop("s1", "l1")
                .with_stop("s2", "l2"),
        )
        .await;

        ctx.routes.finish_stop("r1", 1, "l2", 1).await.unwrap();
        let route = ctx.routes.find("r1").await.unwrap();
        assert!(!route.picking_points[0].is_picked());
        assert!(route.picking_points[1].is_picked());
        assert_eq!(route.remaining, Some(1));
        assert_eq!(route.status, RouteStatus::Assigned);
    }

    #[tokio::test]
    async fn listings_filter_by_index_attributes() {
        let ctx = TestContext::new();
        let now = ctx.time.now();
        ctx.seed_route(RouteSeed::closed("available").starting_at(now + Duration::hours(2))).await;
        ctx.seed_route(RouteSeed::closed("too-late").starting_at(now + Duration::hours(30))).await;
        ctx.seed_route(
            RouteSeed::closed("taken")
                .assigned_to("g1")
                .starting_at(now + Duration::hours(3)),
        )
        .await;
        ctx.seed_route(RouteSeed::open("shift").starting_at(now + Duration::days(2))).await;

        let available = ctx.routes.find_available(now, now + Duration::hours(24)).await.unwrap();
        assert_eq!(available.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["available"]);

        let shifts = ctx.routes.find_open_shifts(now, now + Duration::days(7)).await.unwrap();
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].id, "shift");

        let assigned = ctx.routes.find_assigned_to_gatherer("g1").await.unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].id, "taken");

        assert!(ctx.routes.find_assigned_to_gatherer("g2").await.unwrap().is_empty());
        assert!(ctx
            .routes
            .find_available(now + Duration::days(40), now + Duration::days(41))
            .await
            .unwrap()
            .is_empty());
    }
}
