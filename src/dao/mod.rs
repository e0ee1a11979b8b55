/// Live-table storage access for the chat log and snapshot store.
pub mod live_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
