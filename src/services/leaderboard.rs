//! Pure leaderboard aggregation over a room's players and score rows.

use std::collections::HashMap;

use crate::{
    dao::models::{TournamentPlayerEntity, TournamentScoreEntity},
    dto::leaderboard::LeaderboardEntry,
};

/// Running totals of one player's recorded holes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScoreTotals {
    /// Distinct holes recorded.
    pub holes: u32,
    /// Strokes including scratches and penalties.
    pub strokes: u32,
    /// Par summed over the recorded holes.
    pub par: u32,
    /// Scratches summed over the recorded holes.
    pub scratches: u32,
    /// Penalties summed over the recorded holes.
    pub penalties: u32,
}

impl ScoreTotals {
    fn add(&mut self, score: &TournamentScoreEntity) {
        self.holes += 1;
        self.strokes += score.total_strokes();
        self.par += score.par;
        self.scratches += score.scratches;
        self.penalties += score.penalties;
    }

    /// Strokes minus par; negative is under par.
    pub fn relative_to_par(&self) -> i64 {
        i64::from(self.strokes) - i64::from(self.par)
    }
}

/// Sum score rows per tournament player.
///
/// Should a backend ever hand back two rows for the same player and hole, only
/// the most recently updated one is counted.
pub fn totals_by_player(scores: &[TournamentScoreEntity]) -> HashMap<i64, ScoreTotals> {
    let mut latest: HashMap<(i64, u32), &TournamentScoreEntity> = HashMap::new();
    for score in scores {
        latest
            .entry((score.tournament_player_id, score.hole))
            .and_modify(|current| {
                if score.updated_at >= current.updated_at {
                    *current = score;
                }
            })
            .or_insert(score);
    }

    let mut totals: HashMap<i64, ScoreTotals> = HashMap::new();
    for score in latest.into_values() {
        totals
            .entry(score.tournament_player_id)
            .or_default()
            .add(score);
    }
    totals
}

/// Build the ordered leaderboard of a room.
///
/// DNF players are left out; players without any hole appear with zero
/// totals. Rows are ordered by relative-to-par, then total strokes, then
/// name ignoring case, then id. Equal relative-to-par shares a position and
/// the following position skips accordingly.
pub fn compute_leaderboard(
    players: &[TournamentPlayerEntity],
    scores: &[TournamentScoreEntity],
) -> Vec<LeaderboardEntry> {
    let totals = totals_by_player(scores);

    let mut rows: Vec<(&TournamentPlayerEntity, ScoreTotals, String)> = players
        .iter()
        .filter(|player| !player.did_not_finish)
        .map(|player| {
            let player_totals = totals.get(&player.id).copied().unwrap_or_default();
            (player, player_totals, player.name.to_lowercase())
        })
        .collect();

    rows.sort_by(|(a, a_totals, a_key), (b, b_totals, b_key)| {
        a_totals
            .relative_to_par()
            .cmp(&b_totals.relative_to_par())
            .then(a_totals.strokes.cmp(&b_totals.strokes))
            .then_with(|| a_key.cmp(b_key))
            .then(a.id.cmp(&b.id))
    });

    let mut entries = Vec::with_capacity(rows.len());
    let mut position = 0;
    let mut previous: Option<i64> = None;
    for (index, (player, player_totals, _)) in rows.into_iter().enumerate() {
        let relative = player_totals.relative_to_par();
        if previous != Some(relative) {
            position = index as u32 + 1;
            previous = Some(relative);
        }
        entries.push(LeaderboardEntry {
            position,
            player_id: player.id,
            name: player.name.clone(),
            group: player.group.clone(),
            total_strokes: player_totals.strokes,
            total_par: player_totals.par,
            holes_completed: player_totals.holes,
            relative_to_par: relative,
            total_scratches: player_totals.scratches,
            total_penalties: player_totals.penalties,
        });
    }
    entries
}
