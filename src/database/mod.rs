pub mod fixtures;
pub mod manager;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

use std::sync::Arc;
use tracing::info;

use crate::config::{StoreBackend, StoreConfig};
use crate::models::route::fields;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgRecordStore;
pub use record::{Record, RecordError};
pub use store::{RecordStore, StoreError};

/// Build the configured record store, creating Postgres tables and indexes when needed
pub async fn open_store(settings: &StoreConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
    match settings.backend {
        StoreBackend::Memory => {
            info!("Using in-memory record store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let store = PgRecordStore::connect(settings).await?;
            store
                .ensure_table(
                    &settings.routes_table,
                    &[
                        &[fields::STATUS, fields::STARTS_AT],
                        &[fields::GATHERER_ID, fields::STATUS],
                    ],
                )
                .await?;
            store.ensure_table(&settings.users_table, &[]).await?;
            store.ensure_table(&settings.locations_table, &[&["created_by"]]).await?;
            info!("Using Postgres record store");
            Ok(Arc::new(store))
        }
    }
}
