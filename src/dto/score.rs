//! DTOs for per-hole score submission and sync.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dao::models::TournamentScoreEntity, dto::format_system_time};

/// One hole submitted by a device. Resubmitting the same player and hole overwrites it.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct SubmitScoreRequest {
    pub tournament_player_id: i64,
    /// Hole number, starting at 1. The upper bound comes from configuration.
    #[validate(range(min = 1, max = 99))]
    pub hole: u32,
    /// Par recorded with the hole; no course lookup is performed.
    #[validate(range(min = 1, max = 10))]
    pub par: u32,
    #[validate(range(min = 1, max = 20))]
    pub strokes: u32,
    #[serde(default)]
    #[validate(range(max = 20))]
    pub scratches: u32,
    #[serde(default)]
    #[validate(range(max = 20))]
    pub penalties: u32,
}

/// Stored score row as exposed to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreSummary {
    pub tournament_player_id: i64,
    pub hole: u32,
    pub par: u32,
    pub strokes: u32,
    pub scratches: u32,
    pub penalties: u32,
    /// strokes + scratches + penalties
    pub total_strokes: u32,
    pub updated_at: String,
}

impl From<&TournamentScoreEntity> for ScoreSummary {
    fn from(value: &TournamentScoreEntity) -> Self {
        Self {
            tournament_player_id: value.tournament_player_id,
            hole: value.hole,
            par: value.par,
            strokes: value.strokes,
            scratches: value.scratches,
            penalties: value.penalties,
            total_strokes: value.total_strokes(),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratches_and_penalties_default_to_zero() {
        let request: SubmitScoreRequest = serde_json::from_str(
            r#"{"tournament_player_id": 3, "hole": 1, "par": 3, "strokes": 4}"#,
        )
        .unwrap();
        assert_eq!(request.scratches, 0);
        assert_eq!(request.penalties, 0);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let request = SubmitScoreRequest {
            tournament_player_id: 3,
            hole: 0,
            par: 11,
            strokes: 0,
            scratches: 21,
            penalties: 0,
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        for field in ["hole", "par", "strokes", "scratches"] {
            assert!(fields.contains_key(field), "{field} should be rejected");
        }
    }
}
