use serde::Serialize;
use utoipa::ToSchema;

/// Overall state reported by `/healthcheck`.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Ok,
    /// No storage backend; storage-backed routes answer 503.
    Degraded,
}

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Rooms with at least one live event stream hub.
    pub live_rooms: usize,
}
