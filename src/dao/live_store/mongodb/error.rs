use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias for MongoDB DAO operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Errors surfaced by the MongoDB live store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// URI that failed to parse.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver client could not be constructed.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered the initial ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Number of ping attempts made.
        attempts: u32,
        /// Driver error from the final attempt.
        #[source]
        source: MongoError,
    },
    /// A health-check ping failed on an established connection.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Index bootstrap failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Index key description.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A chat log poll query failed.
    #[error("failed to list messages for room `{room_id}`")]
    ListMessages {
        /// Room being polled.
        room_id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The cursor-seed lookup failed.
    #[error("failed to look up the latest message for room `{room_id}`")]
    LatestMessage {
        /// Room being seeded.
        room_id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The snapshot read for the REST sync pull failed.
    #[error("failed to load table state for `{table_id}`")]
    LoadTableState {
        /// Table being read.
        table_id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
