use anyhow::Context;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{fixtures, open_store, RecordStore};
use crate::engine::{Engine, ListingWindows};
use crate::services::{
    StoreLocationDirectory, StoreRouteRepository, StoreUserDirectory, TimeService, UuidGenerator,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    /// Wire the engine over an already opened store
    pub fn new(store: Arc<dyn RecordStore>, config: &AppConfig, time: TimeService) -> Self {
        let engine = Engine::new(
            Arc::new(StoreRouteRepository::new(
                store.clone(),
                config.store.routes_table.clone(),
                time,
                Arc::new(UuidGenerator),
            )),
            Arc::new(StoreUserDirectory::new(store.clone(), config.store.users_table.clone())),
            Arc::new(StoreLocationDirectory::new(store.clone(), config.store.locations_table.clone())),
            time,
            ListingWindows::from(&config.schedule),
        );
        Self { engine, store }
    }

    /// Open the configured store, seed fixtures if configured, and wire the engine
    pub async fn bootstrap(config: &AppConfig) -> anyhow::Result<Self> {
        let time = TimeService::new(&config.schedule.timezone)
            .with_context(|| format!("invalid TIMEZONE {}", config.schedule.timezone))?;
        let store = open_store(&config.store).await.context("failed to open record store")?;

        if let Some(path) = &config.store.fixtures_path {
            fixtures::load(store.as_ref(), &config.store, &time, path)
                .await
                .with_context(|| format!("failed to load fixtures from {}", path))?;
        }

        Ok(Self::new(store, config, time))
    }
}
