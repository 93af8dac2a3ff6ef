//! Player ids, signups and the per-player group score table row.

use serde::{Deserialize, Serialize};

/// Identifier of a ladder player (the player's handle in the event log).
pub type PlayerId = String;

/// A player's signup for a tournament.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Signup {
    pub player: PlayerId,
    /// Epoch milliseconds.
    pub time: i64,
}

/// Group stage standing of one player. Recomputed on every build, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupScore {
    pub player: PlayerId,
    pub score: f64,
    /// `score` with every point multiplied by `group_size_adjustment_factor`.
    pub adjusted_score: f64,
    /// `(largest group size - 1) / (own group size - 1)`.
    pub group_size_adjustment_factor: f64,
    pub wins: u32,
    pub losses: u32,
    /// Games lost by skip.
    pub dnf: u32,
    /// Position in the tournament seed order; final tie-break.
    pub seed_index: usize,
}

impl GroupScore {
    pub fn new(player: impl Into<PlayerId>, group_size_adjustment_factor: f64, seed_index: usize) -> Self {
        Self {
            player: player.into(),
            score: 0.0,
            adjusted_score: 0.0,
            group_size_adjustment_factor,
            wins: 0,
            losses: 0,
            dnf: 0,
            seed_index,
        }
    }

    fn add_points(&mut self, points: f64) {
        self.score += points;
        self.adjusted_score += points * self.group_size_adjustment_factor;
    }

    /// Record a win worth `points`.
    pub fn add_win(&mut self, points: f64) {
        self.wins += 1;
        self.add_points(points);
    }

    /// Record a played loss worth `points`.
    pub fn add_loss(&mut self, points: f64) {
        self.losses += 1;
        self.add_points(points);
    }

    /// Record a loss by skip worth `points`.
    pub fn add_dnf(&mut self, points: f64) {
        self.dnf += 1;
        self.add_points(points);
    }
}
