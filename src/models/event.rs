//! The event log: a closed union of everything the engine reads.

use crate::models::game::{CompletedGame, GameScore, SkippedGame};
use crate::models::player::PlayerId;
use crate::models::tournament::TournamentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PlayerCreated {
        player: PlayerId,
        time: i64,
    },
    GameCreated {
        winner: PlayerId,
        loser: PlayerId,
        played_at: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<GameScore>,
    },
    TournamentCreated {
        tournament_id: TournamentId,
        name: String,
        #[serde(default)]
        description: String,
        start_date: i64,
        #[serde(default)]
        group_play_enabled: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_order: Option<Vec<PlayerId>>,
        time: i64,
    },
    TournamentPlayerOrderSet {
        tournament_id: TournamentId,
        player_order: Vec<PlayerId>,
        time: i64,
    },
    TournamentSignup {
        tournament_id: TournamentId,
        player: PlayerId,
        time: i64,
    },
    TournamentSkip {
        tournament_id: TournamentId,
        skip_id: Uuid,
        advancing_player: PlayerId,
        eliminated_player: PlayerId,
        time: i64,
    },
}

impl Event {
    /// When the event took effect (epoch milliseconds).
    pub fn time(&self) -> i64 {
        match self {
            Event::PlayerCreated { time, .. }
            | Event::TournamentCreated { time, .. }
            | Event::TournamentPlayerOrderSet { time, .. }
            | Event::TournamentSignup { time, .. }
            | Event::TournamentSkip { time, .. } => *time,
            Event::GameCreated { played_at, .. } => *played_at,
        }
    }

    pub fn game(game: &CompletedGame) -> Self {
        Event::GameCreated {
            winner: game.winner.clone(),
            loser: game.loser.clone(),
            played_at: game.played_at,
            score: game.score.clone(),
        }
    }

    pub fn skip(tournament_id: impl Into<TournamentId>, skip: &SkippedGame) -> Self {
        Event::TournamentSkip {
            tournament_id: tournament_id.into(),
            skip_id: skip.skip_id,
            advancing_player: skip.advancing_player.clone(),
            eliminated_player: skip.eliminated_player.clone(),
            time: skip.time,
        }
    }
}
