//! Completed games, skips and the tournament match node shared by groups and brackets.

use crate::models::player::PlayerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Optional score detail of a played game.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameScore {
    pub winner_points: u32,
    pub loser_points: u32,
}

/// A ladder game that has been played.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CompletedGame {
    pub winner: PlayerId,
    pub loser: PlayerId,
    /// Epoch milliseconds.
    pub played_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<GameScore>,
}

/// A tournament match resolved without play (walkover).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SkippedGame {
    pub skip_id: Uuid,
    pub advancing_player: PlayerId,
    pub eliminated_player: PlayerId,
    pub time: i64,
}

impl SkippedGame {
    pub fn new(advancing_player: impl Into<PlayerId>, eliminated_player: impl Into<PlayerId>, time: i64) -> Self {
        Self {
            skip_id: Uuid::new_v4(),
            advancing_player: advancing_player.into(),
            eliminated_player: eliminated_player.into(),
            time,
        }
    }
}

/// Which slot of a match a player occupies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Player1,
    Player2,
}

/// Where the winner of a bracket match plays next.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AdvanceTo {
    pub layer_index: usize,
    pub game_index: usize,
    pub role: Role,
}

/// A single group or bracket match.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentGame {
    pub player1: Option<PlayerId>,
    pub player2: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    pub skipped: Option<SkippedGame>,
    pub completed_at: Option<i64>,
    /// Bracket only; `None` for the final and for group games.
    pub advance_to: Option<AdvanceTo>,
}

impl TournamentGame {
    pub fn new(player1: impl Into<PlayerId>, player2: impl Into<PlayerId>) -> Self {
        Self {
            player1: Some(player1.into()),
            player2: Some(player2.into()),
            ..Self::default()
        }
    }

    pub fn slot(&self, role: Role) -> Option<&PlayerId> {
        match role {
            Role::Player1 => self.player1.as_ref(),
            Role::Player2 => self.player2.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, role: Role) -> &mut Option<PlayerId> {
        match role {
            Role::Player1 => &mut self.player1,
            Role::Player2 => &mut self.player2,
        }
    }

    /// The role `player` occupies, if any.
    pub fn role_of(&self, player: &str) -> Option<Role> {
        if self.player1.as_deref() == Some(player) {
            Some(Role::Player1)
        } else if self.player2.as_deref() == Some(player) {
            Some(Role::Player2)
        } else {
            None
        }
    }

    pub fn has_both_players(&self) -> bool {
        self.player1.is_some() && self.player2.is_some()
    }

    pub fn is_resolved(&self) -> bool {
        self.winner.is_some() || self.skipped.is_some()
    }

    /// Still waiting for a result (no winner and no completion time).
    pub fn is_open(&self) -> bool {
        self.winner.is_none() && self.completed_at.is_none()
    }

    /// Both players known and no result yet.
    pub fn is_playable(&self) -> bool {
        self.has_both_players() && !self.is_resolved()
    }

    /// Both players known and resolved.
    pub fn is_played(&self) -> bool {
        self.has_both_players() && self.is_resolved()
    }

    /// True if the two slots hold exactly `a` and `b`, in either order.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        match (self.player1.as_deref(), self.player2.as_deref()) {
            (Some(p1), Some(p2)) => (p1 == a && p2 == b) || (p1 == b && p2 == a),
            _ => false,
        }
    }

    pub fn involves(&self, player: &str) -> bool {
        self.role_of(player).is_some()
    }

    /// The player who did not win, once resolved.
    pub fn loser(&self) -> Option<&PlayerId> {
        let winner = self.winner.as_deref()?;
        match self.role_of(winner)? {
            Role::Player1 => self.player2.as_ref(),
            Role::Player2 => self.player1.as_ref(),
        }
    }

    /// Apply a result to this match.
    pub(crate) fn resolve(&mut self, event: &RelevantGame) {
        self.winner = Some(event.player1.clone());
        self.completed_at = Some(event.time);
        self.skipped = event.skip.clone();
    }
}

/// A completed game or a skip normalised for match filling.
///
/// `player1` is the winner (or advancing player), `player2` the loser (or eliminated player).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelevantGame {
    pub time: i64,
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub skip: Option<SkippedGame>,
}

impl From<&CompletedGame> for RelevantGame {
    fn from(game: &CompletedGame) -> Self {
        Self {
            time: game.played_at,
            player1: game.winner.clone(),
            player2: game.loser.clone(),
            skip: None,
        }
    }
}

impl From<&SkippedGame> for RelevantGame {
    fn from(skip: &SkippedGame) -> Self {
        Self {
            time: skip.time,
            player1: skip.advancing_player.clone(),
            player2: skip.eliminated_player.clone(),
            skip: Some(skip.clone()),
        }
    }
}
