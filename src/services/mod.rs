/// Player action dispatch.
pub mod action_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Masked room snapshots.
pub mod query_service;
/// Room creation, joining and external channel hooks.
pub mod room_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Background storage connection supervisor.
pub mod storage_supervisor;
