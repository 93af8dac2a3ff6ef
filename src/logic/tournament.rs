//! The tournament aggregate: decides which stages apply and answers queries about them.

use crate::logic::bracket::Bracket;
use crate::logic::group_play::GroupPlay;
use crate::models::{
    CompletedGame, GroupScore, PlayerId, RelevantGame, Signup, SkippedGame, TournamentConfig, TournamentError,
    TournamentGame, TournamentId, TournamentStage,
};
use chrono::{Duration, Utc};
use serde::Serialize;

/// Points for a won group game (also for the advancing side of a skip).
pub const POINTS_WIN: f64 = 3.0;
/// Points for a lost group game.
pub const POINTS_LOSS: f64 = 1.0;
/// Points for the eliminated side of a skip.
pub const POINTS_SKIP: f64 = 1.0;

/// How long a champion counts as the recent winner.
pub fn recent_winner_window() -> Duration {
    Duration::weeks(2)
}

/// How long before the start date signups are open.
pub fn signup_window() -> Duration {
    Duration::weeks(2)
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Games and skips at or after `since`, normalised and sorted by time.
pub fn relevant_games(games: &[CompletedGame], skips: &[SkippedGame], since: i64) -> Vec<RelevantGame> {
    let mut events: Vec<RelevantGame> = games
        .iter()
        .filter(|g| g.played_at >= since)
        .map(RelevantGame::from)
        .chain(skips.iter().filter(|s| s.time >= since).map(RelevantGame::from))
        .collect();
    events.sort_by_key(|e| e.time);
    events
}

/// Signup window opening and start date of a config.
pub(crate) fn config_boundaries(config: &TournamentConfig) -> Vec<i64> {
    let start = config.start_date;
    vec![start - signup_window().num_milliseconds(), start]
}

/// Where a pending game sits inside its tournament.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PendingStage {
    Group { group_index: usize },
    Bracket { layer_index: usize },
}

/// An unplayed tournament game with both players known.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PendingGame {
    pub tournament_id: TournamentId,
    #[serde(flatten)]
    pub stage: PendingStage,
    pub game: TournamentGame,
}

/// One tournament built from a snapshot of the event log at time `now`.
#[derive(Clone, Debug, PartialEq)]
pub struct Tournament {
    pub config: TournamentConfig,
    pub skips: Vec<SkippedGame>,
    pub now: i64,
    pub stage: TournamentStage,
    pub group_play: Option<GroupPlay>,
    pub bracket: Option<Bracket>,
}

impl Tournament {
    /// Build the tournament from its config, the global game list and its skips.
    pub fn build(
        config: TournamentConfig,
        games: &[CompletedGame],
        skips: Vec<SkippedGame>,
        now: i64,
    ) -> Result<Self, TournamentError> {
        let start = config.start_date;
        let mut tournament = Self {
            config,
            skips,
            now,
            stage: TournamentStage::NotStarted,
            group_play: None,
            bracket: None,
        };
        if now < start {
            return Ok(tournament);
        }

        let events = relevant_games(games, &tournament.skips, start);
        let seeds = tournament.config.seed_order();
        let bracket = if tournament.config.group_play_enabled {
            let group_play = GroupPlay::build(&seeds, start, &events);
            let bracket = match group_play.ended {
                Some(ended) => Some(Bracket::build(&group_play.bracket_seed_order(), ended + 1, &events)?),
                None => None,
            };
            tournament.group_play = Some(group_play);
            bracket
        } else {
            Some(Bracket::build(&seeds, start, &events)?)
        };

        tournament.stage = match &bracket {
            None => TournamentStage::GroupStage,
            Some(b) if b.winner().is_some() => TournamentStage::Completed,
            Some(_) => TournamentStage::BracketStage,
        };
        tournament.bracket = bracket;
        log::debug!("tournament {} built at {}: {:?}", tournament.config.id, now, tournament.stage);
        Ok(tournament)
    }

    pub fn id(&self) -> &TournamentId {
        &self.config.id
    }

    /// Times at which the clock alone changes what this tournament reports.
    ///
    /// A build at `a` and one at `b` answer alike unless a boundary `t` has
    /// `min(a, b) < t <= max(a, b)`.
    pub fn time_boundaries(&self) -> Vec<i64> {
        let mut boundaries = config_boundaries(&self.config);
        if let Some(ended) = self.ended() {
            boundaries.push(ended + recent_winner_window().num_milliseconds() + 1);
        }
        boundaries
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.bracket.as_ref().and_then(Bracket::winner)
    }

    /// When the final was resolved.
    pub fn ended(&self) -> Option<i64> {
        self.bracket.as_ref().and_then(Bracket::ended)
    }

    /// The champion, if the final was resolved within the recent winner window.
    pub fn recent_winner(&self) -> Option<&PlayerId> {
        let ended = self.ended()?;
        if ended >= self.now - recent_winner_window().num_milliseconds() {
            self.winner()
        } else {
            None
        }
    }

    pub fn in_signup_period(&self) -> bool {
        let start = self.config.start_date;
        self.now < start && self.now >= start - signup_window().num_milliseconds()
    }

    /// Pending games of the active stage.
    pub fn pending_games(&self) -> Vec<PendingGame> {
        let group = self
            .group_play
            .iter()
            .filter(|gp| !gp.has_ended())
            .flat_map(|gp| gp.pending())
            .map(|(group_index, game)| (PendingStage::Group { group_index }, game));
        let bracket = self
            .bracket
            .iter()
            .flat_map(|b| b.pending())
            .map(|(layer_index, game)| (PendingStage::Bracket { layer_index }, game));
        group
            .chain(bracket)
            .map(|(stage, game)| PendingGame {
                tournament_id: self.config.id.clone(),
                stage,
                game: game.clone(),
            })
            .collect()
    }

    pub fn has_pending_games(&self) -> bool {
        match self.stage {
            TournamentStage::GroupStage => self
                .group_play
                .as_ref()
                .is_some_and(|gp| gp.pending().next().is_some()),
            TournamentStage::BracketStage => self.bracket.as_ref().is_some_and(|b| b.pending().next().is_some()),
            TournamentStage::NotStarted | TournamentStage::Completed => false,
        }
    }

    /// The pending game between `player1` and `player2`, groups first.
    pub fn find_pending_game(&self, player1: &str, player2: &str) -> Option<PendingGame> {
        self.pending_games()
            .into_iter()
            .find(|p| p.game.is_between(player1, player2))
    }

    pub fn pending_games_for(&self, player: &str) -> Vec<PendingGame> {
        self.pending_games()
            .into_iter()
            .filter(|p| p.game.involves(player))
            .collect()
    }

    pub fn summary(&self) -> TournamentSummary {
        TournamentSummary {
            id: self.config.id.clone(),
            name: self.config.name.clone(),
            start_date: self.config.start_date,
            stage: self.stage,
            champion: self.winner().cloned(),
        }
    }

    /// Everything the UI shows for one tournament.
    pub fn view(&self) -> TournamentView {
        let groups = self
            .group_play
            .iter()
            .flat_map(|gp| gp.groups.iter())
            .map(|g| GroupView {
                players: g.players.clone(),
                scores: g.scores.clone(),
                played: g.played().cloned().collect(),
                pending: g.pending().cloned().collect(),
            })
            .collect();
        let bracket = self
            .bracket
            .iter()
            .flat_map(|b| {
                b.layers.iter().enumerate().map(|(layer_index, games)| LayerView {
                    layer_index,
                    games: games.clone(),
                    played: b.played(layer_index).into_iter().cloned().collect(),
                    pending: b.pending_in(layer_index).into_iter().cloned().collect(),
                })
            })
            .collect();
        TournamentView {
            id: self.config.id.clone(),
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            start_date: self.config.start_date,
            stage: self.stage,
            signed_up: self.config.signed_up.clone(),
            groups,
            bracket,
            champion: self.winner().cloned(),
            recent_winner: self.recent_winner().cloned(),
            in_signup_period: self.in_signup_period(),
            has_pending_games: self.has_pending_games(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TournamentSummary {
    pub id: TournamentId,
    pub name: String,
    pub start_date: i64,
    pub stage: TournamentStage,
    pub champion: Option<PlayerId>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GroupView {
    pub players: Vec<PlayerId>,
    pub scores: Vec<GroupScore>,
    pub played: Vec<TournamentGame>,
    pub pending: Vec<TournamentGame>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LayerView {
    pub layer_index: usize,
    pub games: Vec<TournamentGame>,
    pub played: Vec<TournamentGame>,
    pub pending: Vec<TournamentGame>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TournamentView {
    pub id: TournamentId,
    pub name: String,
    pub description: String,
    pub start_date: i64,
    pub stage: TournamentStage,
    pub signed_up: Vec<Signup>,
    pub groups: Vec<GroupView>,
    /// Layer 0 is the final.
    pub bracket: Vec<LayerView>,
    pub champion: Option<PlayerId>,
    pub recent_winner: Option<PlayerId>,
    pub in_signup_period: bool,
    pub has_pending_games: bool,
}
