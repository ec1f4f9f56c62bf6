use thiserror::Error;

use crate::dao::models::TournamentEntity;

/// Phases a tournament room moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TournamentPhase {
    /// Room is open for registration; play has not officially started.
    Active,
    /// Director started play; registration and scoring continue.
    Started,
    /// Room is closed and archived. Terminal.
    Closed,
}

/// Director actions that move a room between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TournamentEvent {
    /// Director starts play.
    Start,
    /// Director closes the room.
    Close,
}

/// Error returned when an event cannot be applied from the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while {from:?}")]
pub struct InvalidTransition {
    /// The phase the room was in when the event was received.
    pub from: TournamentPhase,
    /// The rejected event.
    pub event: TournamentEvent,
}

impl TournamentPhase {
    /// Derive the phase from the persisted flags.
    pub fn of(tournament: &TournamentEntity) -> Self {
        if tournament.is_completed || !tournament.is_active {
            TournamentPhase::Closed
        } else if tournament.is_started {
            TournamentPhase::Started
        } else {
            TournamentPhase::Active
        }
    }

    /// Compute the phase reached by applying `event`.
    pub fn next(self, event: TournamentEvent) -> Result<Self, InvalidTransition> {
        match (self, event) {
            (TournamentPhase::Active, TournamentEvent::Start) => Ok(TournamentPhase::Started),
            (TournamentPhase::Active | TournamentPhase::Started, TournamentEvent::Close) => {
                Ok(TournamentPhase::Closed)
            }
            (from, event) => Err(InvalidTransition { from, event }),
        }
    }

    /// Whether players may still register or submit scores.
    pub fn accepts_play(self) -> bool {
        !matches!(self, TournamentPhase::Closed)
    }

    /// Write the phase back into the persisted flags.
    pub fn apply_to(self, tournament: &mut TournamentEntity) {
        let (is_active, is_started, is_completed) = match self {
            TournamentPhase::Active => (true, false, false),
            TournamentPhase::Started => (true, true, false),
            TournamentPhase::Closed => (false, tournament.is_started, true),
        };
        tournament.is_active = is_active;
        tournament.is_started = is_started;
        tournament.is_completed = is_completed;
    }

    /// Wire name used in DTOs and events.
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentPhase::Active => "active",
            TournamentPhase::Started => "started",
            TournamentPhase::Closed => "closed",
        }
    }
}
