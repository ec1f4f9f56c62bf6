use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod directory;
pub mod health;
pub mod leaderboard;
pub mod player;
pub mod score;
pub mod sse;
pub mod tournament;
pub mod validation;

/// Render a timestamp as RFC 3339.
pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an RFC 3339 timestamp supplied by a client.
pub(crate) fn parse_system_time(value: &str) -> Result<SystemTime, time::error::Parse> {
    OffsetDateTime::parse(value, &Rfc3339).map(SystemTime::from)
}
