//! Handicap-style infraction statistics (PPT and PPC) of a directory player.

use crate::{dao::models::PlayerHistoryEntity, services::leaderboard::ScoreTotals};

/// Aggregated statistics over archived history and live participation.
#[derive(Debug, Clone, PartialEq)]
pub struct HandicapStats {
    /// History entries counted.
    pub completed_tournaments: u32,
    /// Open rooms counted.
    pub live_tournaments: u32,
    /// Holes over history and live rooms.
    pub holes_played: u64,
    /// Scratches plus penalties.
    pub infractions: u64,
    /// Strokes including scratches and penalties.
    pub total_strokes: u64,
    /// Par over the same holes.
    pub total_par: u64,
    /// Mean of strokes minus par per counted tournament.
    pub average_relative_to_par: f64,
    /// Infractions per counted tournament.
    pub ppt: f64,
    /// Infractions per hole played.
    pub ppc: f64,
}

/// Combine history entries with the totals of rooms still in play.
///
/// `live` holds one entry per open room the player takes part in; rooms where
/// no hole has been recorded yet should be left out by the caller.
pub fn compute_handicap(history: &[PlayerHistoryEntity], live: &[ScoreTotals]) -> HandicapStats {
    let mut holes_played = 0u64;
    let mut infractions = 0u64;
    let mut total_strokes = 0u64;
    let mut total_par = 0u64;

    for entry in history {
        holes_played += u64::from(entry.holes_played);
        infractions += u64::from(entry.penalties) + u64::from(entry.scratches);
        total_strokes += u64::from(entry.total_strokes);
        total_par += u64::from(entry.total_par);
    }
    for totals in live {
        holes_played += u64::from(totals.holes);
        infractions += u64::from(totals.scratches) + u64::from(totals.penalties);
        total_strokes += u64::from(totals.strokes);
        total_par += u64::from(totals.par);
    }

    let completed_tournaments = u32::try_from(history.len()).unwrap_or(u32::MAX);
    let live_tournaments = u32::try_from(live.len()).unwrap_or(u32::MAX);
    let counted = u64::from(completed_tournaments) + u64::from(live_tournaments);
    let relative = total_strokes as f64 - total_par as f64;

    HandicapStats {
        completed_tournaments,
        live_tournaments,
        holes_played,
        infractions,
        total_strokes,
        total_par,
        average_relative_to_par: ratio(relative, counted),
        ppt: ratio(infractions as f64, counted),
        ppc: ratio(infractions as f64, holes_played),
    }
}

fn ratio(numerator: f64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::HistorySource;

    fn entry(holes: u32, strokes: u32, par: u32, scratches: u32, penalties: u32) -> PlayerHistoryEntity {
        PlayerHistoryEntity {
            id: 1,
            universal_player_id: 1,
            tournament_name: "Club night".into(),
            tournament_id: None,
            played_at: SystemTime::UNIX_EPOCH,
            holes_played: holes,
            total_strokes: strokes,
            total_par: par,
            scratches,
            penalties,
            source: HistorySource::Manual,
        }
    }

    #[test]
    fn ppt_counts_penalties_and_scratches_per_tournament() {
        let history = [entry(9, 30, 27, 1, 2), entry(9, 28, 27, 0, 1)];
        let stats = compute_handicap(&history, &[]);
        assert_eq!(stats.completed_tournaments, 2);
        assert_eq!(stats.infractions, 4);
        assert_eq!(stats.ppt, 2.0);
        assert_eq!(stats.ppc, 4.0 / 18.0);
        assert_eq!(stats.average_relative_to_par, 2.0);
    }

    #[test]
    fn live_rooms_are_counted_alongside_history() {
        let history = [entry(18, 60, 54, 0, 2)];
        let live = [ScoreTotals {
            holes: 2,
            strokes: 8,
            par: 6,
            scratches: 1,
            penalties: 1,
        }];
        let stats = compute_handicap(&history, &live);
        assert_eq!(stats.completed_tournaments, 1);
        assert_eq!(stats.live_tournaments, 1);
        assert_eq!(stats.holes_played, 20);
        assert_eq!(stats.ppt, 2.0);
        assert_eq!(stats.ppc, 0.2);
    }

    #[test]
    fn empty_history_yields_zero_rates() {
        let stats = compute_handicap(&[], &[]);
        assert_eq!(stats.ppt, 0.0);
        assert_eq!(stats.ppc, 0.0);
        assert_eq!(stats.average_relative_to_par, 0.0);
    }

    #[test]
    fn large_history_totals_do_not_overflow() {
        let history = [
            entry(99, 3_000_000_000, 3_000_000_000, u32::MAX, u32::MAX),
            entry(99, 3_000_000_000, 2_000_000_000, u32::MAX, u32::MAX),
        ];
        let stats = compute_handicap(&history, &[]);
        assert_eq!(stats.total_strokes, 6_000_000_000);
        assert_eq!(stats.total_par, 5_000_000_000);
        assert_eq!(stats.infractions, 4 * u64::from(u32::MAX));
        assert_eq!(stats.average_relative_to_par, 500_000_000.0);
        assert_eq!(stats.ppt, 2.0 * f64::from(u32::MAX));
    }
}
