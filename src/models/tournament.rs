//! Tournament configuration, stage and errors.

use crate::models::player::{PlayerId, Signup};
use serde::{Deserialize, Serialize};

/// Identifier of a tournament.
pub type TournamentId = String;

/// Errors that abort a tournament or prediction computation.
///
/// All of them mean the seed order or the event history is inconsistent; none are retried.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TournamentError {
    /// The mirror opponent of a seed was not found in the previous layer.
    #[error("seed {seed} ({player}): mirror seed {mirror} not found in layer {layer}")]
    SeedMirrorNotFound {
        seed: usize,
        player: PlayerId,
        mirror: usize,
        layer: usize,
    },
    /// A seed was placed into a bracket slot that already holds a player.
    #[error("seed {seed} ({player}): slot {game} in layer {layer} is already occupied")]
    SeedSlotOccupied {
        seed: usize,
        player: PlayerId,
        layer: usize,
        game: usize,
    },
    /// A match winner was routed into a slot that already holds a player.
    #[error("winner {winner} cannot advance to layer {layer} game {game}: slot already occupied")]
    AdvancementConflict {
        winner: PlayerId,
        layer: usize,
        game: usize,
    },
    /// The simulation ran more rounds than allowed without producing a champion.
    #[error("simulation of {tournament} ran {rounds} rounds without a champion")]
    SimulationDiverged { tournament: TournamentId, rounds: usize },
    /// The simulation ran out of playable matches without producing a champion.
    #[error("simulation of {tournament} has no playable matches and no champion")]
    SimulationStalled { tournament: TournamentId },
    #[error("tournament {0} not found")]
    UnknownTournament(TournamentId),
}

impl TournamentError {
    /// True for the seed placement failures raised while building a bracket.
    pub fn is_seed_placement(&self) -> bool {
        matches!(
            self,
            TournamentError::SeedMirrorNotFound { .. } | TournamentError::SeedSlotOccupied { .. }
        )
    }
}

/// Current phase of a tournament, derived from the clock and the event log.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStage {
    /// Start date not reached; signups may be open.
    #[default]
    NotStarted,
    /// Round robin groups still have open games.
    GroupStage,
    /// Knockout bracket in progress.
    BracketStage,
    /// Bracket final resolved.
    Completed,
}

/// Tournament settings as created by an admin or read from the legacy config file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub id: TournamentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Epoch milliseconds.
    pub start_date: i64,
    #[serde(default)]
    pub group_play_enabled: bool,
    /// Admin seed order, best first. Falls back to signup order when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_order: Option<Vec<PlayerId>>,
    #[serde(default)]
    pub signed_up: Vec<Signup>,
}

impl TournamentConfig {
    pub fn new(id: impl Into<TournamentId>, name: impl Into<String>, start_date: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            start_date,
            group_play_enabled: false,
            player_order: None,
            signed_up: Vec::new(),
        }
    }

    /// Seed order used for group assignment and bracket placement.
    pub fn seed_order(&self) -> Vec<PlayerId> {
        match &self.player_order {
            Some(order) => order.clone(),
            None => self.signed_up.iter().map(|s| s.player.clone()).collect(),
        }
    }

    pub fn is_signed_up(&self, player: &str) -> bool {
        self.signed_up.iter().any(|s| s.player == player)
    }
}
