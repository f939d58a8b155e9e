use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::database::memory::MemoryStore;
use crate::database::store::{Item, RecordQuery, RecordStore, StoreError, Update};
use crate::models::{Location, Route, RouteStatus, Stop, User, UNASSIGNED};
use crate::services::{
    IdGenerator, StoreLocationDirectory, StoreRouteRepository, StoreUserDirectory, TimeService,
};

pub const ROUTES: &str = "picking_routes";
pub const USERS: &str = "users";
pub const LOCATIONS: &str = "locations";

/// Deterministic ids: `id-1`, `id-2`, ...
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicUsize,
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        format!("id-{}", self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Memory store that counts writes so tests can assert that nothing was persisted
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn get(&self, table: &str, id: &str) -> Result<Option<Item>, StoreError> {
        self.inner.get(table, id).await
    }

    async fn put(&self, table: &str, item: Item) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put(table, item).await
    }

    async fn update(&self, table: &str, id: &str, update: Update) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update(table, id, update).await
    }

    async fn query(&self, table: &str, query: &RecordQuery) -> Result<Vec<Item>, StoreError> {
        self.inner.query(table, query).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}

/// Store-backed repositories wired over one in-memory store
pub struct TestContext {
    pub store: Arc<CountingStore>,
    pub time: TimeService,
    pub routes: Arc<StoreRouteRepository>,
    pub users: Arc<StoreUserDirectory>,
    pub locations: Arc<StoreLocationDirectory>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(CountingStore::default());
        let time = TimeService::new("America/Argentina/Buenos_Aires").expect("known zone");
        let shared: Arc<dyn RecordStore> = store.clone();

        Self {
            routes: Arc::new(StoreRouteRepository::new(
                shared.clone(),
                ROUTES,
                time,
                Arc::new(SequentialIds::default()),
            )),
            users: Arc::new(StoreUserDirectory::new(shared.clone(), USERS)),
            locations: Arc::new(StoreLocationDirectory::new(shared, LOCATIONS)),
            store,
            time,
        }
    }

    pub fn writes(&self) -> usize {
        self.store.writes()
    }

    pub async fn seed_user(&self, id: &str, user_type: &str) -> User {
        let item = object(json!({
            "id": id,
            "username": format!("{}_name", id),
            "firstname": "Test",
            "lastname": id,
            "type": user_type,
            "country": "AR",
        }));
        self.store.inner.put(USERS, item.clone()).await.expect("seed user");
        User::from_record(&crate::database::record::Record::from_item(item)).expect("valid user")
    }

    pub async fn seed_location(&self, id: &str, owner: &str, balance: f64) -> Location {
        let item = object(json!({
            "id": id,
            "created_by": owner,
            "name": format!("{} home", owner),
            "balance": balance,
            "country": "AR",
            "city": "Buenos Aires",
            "state": "CABA",
            "address_1": format!("Calle {} 123", id),
            "address_2": "",
            "latitude": -34.6037,
            "longitude": -58.3816,
        }));
        self.store.inner.put(LOCATIONS, item.clone()).await.expect("seed location");
        Location::from_record(&crate::database::record::Record::from_item(item)).expect("valid location")
    }

    pub async fn seed_route(&self, seed: RouteSeed) -> Route {
        let route = seed.build(&self.time);
        self.store
            .inner
            .put(ROUTES, route.to_item(&self.time))
            .await
            .expect("seed route");
        route
    }

    pub async fn put_raw_route(&self, value: Value) {
        self.store.inner.put(ROUTES, object(value)).await.expect("seed raw route");
    }

    pub async fn raw_route(&self, id: &str) -> Item {
        self.store
            .inner
            .get(ROUTES, id)
            .await
            .expect("read route")
            .expect("route exists")
    }
}

fn object(value: Value) -> Item {
    value.as_object().cloned().expect("json object")
}

/// Builder for routes seeded straight into the store
#[derive(Debug, Clone)]
pub struct RouteSeed {
    id: String,
    status: RouteStatus,
    gatherer_id: String,
    materials: Vec<String>,
    starts_at: Option<DateTime<Utc>>,
    initiated: bool,
    stops: Vec<(String, String, bool)>,
}

impl RouteSeed {
    fn with_status(id: &str, status: RouteStatus) -> Self {
        Self {
            id: id.to_string(),
            status,
            gatherer_id: UNASSIGNED.to_string(),
            materials: vec!["glass".to_string(), "paper".to_string(), "plastic".to_string()],
            starts_at: None,
            initiated: false,
            stops: Vec::new(),
        }
    }

    pub fn open(id: &str) -> Self {
        Self::with_status(id, RouteStatus::Open)
    }

    pub fn closed(id: &str) -> Self {
        Self::with_status(id, RouteStatus::Closed)
    }

    pub fn status(mut self, status: RouteStatus) -> Self {
        self.status = status;
        self
    }

    pub fn assigned_to(mut self, gatherer_id: &str) -> Self {
        self.gatherer_id = gatherer_id.to_string();
        self.status = RouteStatus::Assigned;
        self
    }

    pub fn initiated(mut self) -> Self {
        self.initiated = true;
        self.status = RouteStatus::Initiated;
        self
    }

    pub fn materials(mut self, materials: &[&str]) -> Self {
        self.materials = materials.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn starting_at(mut self, at: DateTime<Utc>) -> Self {
        self.starts_at = Some(at);
        self
    }

    pub fn with_stop(mut self, stop_id: &str, location_id: &str) -> Self {
        self.stops.push((stop_id.to_string(), location_id.to_string(), false));
        self
    }

    pub fn with_picked_stop(mut self, stop_id: &str, location_id: &str) -> Self {
        self.stops.push((stop_id.to_string(), location_id.to_string(), true));
        self
    }

    fn build(self, time: &TimeService) -> Route {
        let now = time.now();
        let picking_points = self
            .stops
            .into_iter()
            .map(|(id, location_id, picked)| Stop {
                id,
                location_id: location_id.clone(),
                country: "AR".to_string(),
                city: "Buenos Aires".to_string(),
                state: "CABA".to_string(),
                address_1: format!("Calle {} 123", location_id),
                address_2: String::new(),
                latitude: -34.6037,
                longitude: -58.3816,
                materials: vec!["glass".to_string()],
                pinned_by: "u1".to_string(),
                picked_at: picked.then_some(now - Duration::minutes(5)),
                created_at: Some(now - Duration::days(1)),
            })
            .collect();

        Route {
            id: self.id,
            sector: "north".to_string(),
            shift: "morning".to_string(),
            materials: self.materials,
            status: self.status,
            gatherer_id: self.gatherer_id,
            starts_at: Some(self.starts_at.unwrap_or(now + Duration::hours(1))),
            initiated_at: self.initiated.then_some(now - Duration::minutes(30)),
            finished_at: None,
            created_at: Some(now - Duration::days(2)),
            remaining: None,
            picking_points,
        }
    }
}
