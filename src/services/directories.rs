use async_trait::async_trait;
use std::sync::Arc;

use crate::database::record::Record;
use crate::database::store::{RecordQuery, RecordStore};
use crate::models::{Location, User};
use crate::services::RepositoryError;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: &str) -> Result<User, RepositoryError>;
}

#[async_trait]
pub trait LocationDirectory: Send + Sync {
    async fn find_location(&self, location_id: &str) -> Result<Location, RepositoryError>;

    /// Locations registered by `user_id`, empty when none
    async fn find_by_owner(&self, user_id: &str) -> Result<Vec<Location>, RepositoryError>;
}

pub struct StoreUserDirectory {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl StoreUserDirectory {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }
}

#[async_trait]
impl UserDirectory for StoreUserDirectory {
    async fn find_user(&self, user_id: &str) -> Result<User, RepositoryError> {
        let item = self
            .store
            .get(&self.table, user_id)
            .await?
            .ok_or_else(|| RepositoryError::UserNotFound(user_id.to_string()))?;
        User::from_record(&Record::from_item(item)).map_err(RepositoryError::malformed(&self.table))
    }
}

pub struct StoreLocationDirectory {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl StoreLocationDirectory {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }
}

#[async_trait]
impl LocationDirectory for StoreLocationDirectory {
    async fn find_location(&self, location_id: &str) -> Result<Location, RepositoryError> {
        let item = self
            .store
            .get(&self.table, location_id)
            .await?
            .ok_or_else(|| RepositoryError::LocationNotFound(location_id.to_string()))?;
        Location::from_record(&Record::from_item(item)).map_err(RepositoryError::malformed(&self.table))
    }

    async fn find_by_owner(&self, user_id: &str) -> Result<Vec<Location>, RepositoryError> {
        let query = RecordQuery::new().where_eq("created_by", user_id);
        self.store
            .query(&self.table, &query)
            .await?
            .into_iter()
            .map(|item| Location::from_record(&Record::from_item(item)).map_err(RepositoryError::malformed(&self.table)))
            .collect()
    }
}
