//! Pairwise win probabilities consulted by the prediction engine.

use crate::logic::projection::ReadModel;
use crate::models::PlayerId;
use serde::Serialize;
use std::collections::HashMap;

/// Default starting Elo for players without games.
pub const DEFAULT_ELO: f64 = 1500.0;

/// K-factor for Elo updates.
pub const K_FACTOR: f64 = 32.0;

/// Games after which confidence reaches one half.
pub const CONFIDENCE_GAMES: f64 = 10.0;

/// Predicted chance that the first player beats the second.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PredictedFraction {
    pub fraction: f64,
    /// In `[0, 1]`.
    pub confidence: f64,
}

pub trait Oracle {
    /// `None` when there is no data for the pair.
    fn predicted_fraction(&self, a: &str, b: &str) -> Option<PredictedFraction>;
}

/// Builds an oracle for a read model snapshot.
pub trait OracleFactory {
    type Oracle: Oracle;

    fn oracle(&self, model: &ReadModel) -> Self::Oracle;
}

impl<F, O> OracleFactory for F
where
    F: Fn(&ReadModel) -> O,
    O: Oracle,
{
    type Oracle = O;

    fn oracle(&self, model: &ReadModel) -> O {
        self(model)
    }
}

/// Elo ratings replayed over every game of a read model.
#[derive(Clone, Debug, Default)]
pub struct EloOracle {
    ratings: HashMap<PlayerId, f64>,
    games_played: HashMap<PlayerId, u32>,
}

impl EloOracle {
    pub fn from_model(model: &ReadModel) -> Self {
        let mut oracle = Self::default();
        for game in &model.games {
            oracle.record(&game.winner, &game.loser);
        }
        oracle
    }

    pub fn rating(&self, player: &str) -> f64 {
        self.ratings.get(player).copied().unwrap_or(DEFAULT_ELO)
    }

    pub fn games_played(&self, player: &str) -> u32 {
        self.games_played.get(player).copied().unwrap_or(0)
    }

    /// Expected score of `a` against `b`.
    pub fn expected_score(&self, a: &str, b: &str) -> f64 {
        1.0 / (1.0 + 10f64.powf((self.rating(b) - self.rating(a)) / 400.0))
    }

    fn record(&mut self, winner: &str, loser: &str) {
        let expected = self.expected_score(winner, loser);
        let change = K_FACTOR * (1.0 - expected);
        *self.ratings.entry(winner.to_string()).or_insert(DEFAULT_ELO) += change;
        *self.ratings.entry(loser.to_string()).or_insert(DEFAULT_ELO) -= change;
        *self.games_played.entry(winner.to_string()).or_insert(0) += 1;
        *self.games_played.entry(loser.to_string()).or_insert(0) += 1;
    }
}

impl Oracle for EloOracle {
    fn predicted_fraction(&self, a: &str, b: &str) -> Option<PredictedFraction> {
        let games = self.games_played(a).min(self.games_played(b));
        if games == 0 {
            return None;
        }
        let games = f64::from(games);
        Some(PredictedFraction {
            fraction: self.expected_score(a, b),
            confidence: games / (games + CONFIDENCE_GAMES),
        })
    }
}
