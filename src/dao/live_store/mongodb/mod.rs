mod config;
mod error;
mod models;
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoLiveStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        let recoverable = matches!(
            err,
            MongoDaoError::ListMessages { .. }
                | MongoDaoError::LatestMessage { .. }
                | MongoDaoError::LoadTableState { .. }
        );
        if recoverable {
            StorageError::query(err.to_string(), err)
        } else {
            StorageError::unavailable(err.to_string(), err)
        }
    }
}
