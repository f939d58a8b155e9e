pub mod directories;
pub mod ids;
pub mod route_repository;
pub mod time;

use thiserror::Error;

use crate::database::record::RecordError;
use crate::database::store::StoreError;

pub use directories::{LocationDirectory, StoreLocationDirectory, StoreUserDirectory, UserDirectory};
pub use ids::{IdGenerator, UuidGenerator};
pub use route_repository::{
    RouteAssigner, RouteFinder, RouteInitiator, RouteLister, RouteRepository, StopFinisher, StopPinner,
    StoreRouteRepository,
};
pub use time::TimeService;

/// Failures shared by the route repository and the user/location directories
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("route not found")]
    RouteNotFound(String),

    #[error("route already assigned")]
    RouteAlreadyAssigned(String),

    #[error("user not found")]
    UserNotFound(String),

    #[error("location not found")]
    LocationNotFound(String),

    #[error("malformed {table} record: {source}")]
    Malformed {
        table: String,
        #[source]
        source: RecordError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepositoryError {
    pub(crate) fn malformed(table: &str) -> impl FnOnce(RecordError) -> Self + '_ {
        move |source| RepositoryError::Malformed {
            table: table.to_string(),
            source,
        }
    }
}
