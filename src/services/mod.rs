/// Best-effort snapshot broadcasting with bounded retry.
pub mod broadcast_service;
/// Chat room stream construction over the append-only message log.
pub mod chat_stream_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Storage connection supervision.
pub mod storage_supervisor;
/// Table state sync pulls.
pub mod table_service;
