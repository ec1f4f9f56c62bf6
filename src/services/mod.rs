/// Persistent player directory, history, merge and import/export.
pub mod directory_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Handicap (PPT/PPC) statistics.
pub mod handicap;
/// Health check service.
pub mod health_service;
/// Leaderboard aggregation.
pub mod leaderboard;
/// Player registration into rooms.
pub mod registration_service;
/// Per-hole score sync.
pub mod score_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming for room subscribers.
pub mod sse_service;
/// Storage connection supervisor with reconnect backoff.
pub mod storage_supervisor;
/// Tournament rooms and their lifecycle.
pub mod tournament_service;
