//! Folds the event log into the read model the tournament engine works from.

use crate::models::{CompletedGame, Event, PlayerId, Signup, SkippedGame, TournamentConfig, TournamentId};
use std::collections::{BTreeMap, BTreeSet};

/// An event sourced tournament.
#[derive(Clone, Debug, PartialEq)]
pub struct TournamentRecord {
    pub config: TournamentConfig,
    pub created_at: i64,
}

/// Snapshot of the event log: players, games in play order, tournaments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadModel {
    pub players: BTreeSet<PlayerId>,
    pub games: Vec<CompletedGame>,
    pub tournaments: BTreeMap<TournamentId, TournamentRecord>,
    /// Skips by tournament id; legacy tournaments have skips in the log too.
    pub skips: BTreeMap<TournamentId, Vec<SkippedGame>>,
}

impl ReadModel {
    /// Apply `events` in chronological order (ties keep log order).
    pub fn from_events(events: &[Event]) -> Self {
        let mut ordered: Vec<&Event> = events.iter().collect();
        ordered.sort_by_key(|e| e.time());
        let mut model = Self::default();
        for event in ordered {
            model.apply(event);
        }
        model
    }

    /// The model as it stood at `time` (events with `time() <= time`).
    pub fn until(events: &[Event], time: i64) -> Self {
        let truncated: Vec<Event> = events.iter().filter(|e| e.time() <= time).cloned().collect();
        Self::from_events(&truncated)
    }

    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::PlayerCreated { player, .. } => {
                self.players.insert(player.clone());
            }
            Event::GameCreated {
                winner,
                loser,
                played_at,
                score,
            } => self.games.push(CompletedGame {
                winner: winner.clone(),
                loser: loser.clone(),
                played_at: *played_at,
                score: score.clone(),
            }),
            Event::TournamentCreated {
                tournament_id,
                name,
                description,
                start_date,
                group_play_enabled,
                player_order,
                time,
            } => {
                if self.tournaments.contains_key(tournament_id) {
                    log::warn!("ignoring duplicate creation of tournament {}", tournament_id);
                    return;
                }
                let config = TournamentConfig {
                    id: tournament_id.clone(),
                    name: name.clone(),
                    description: description.clone(),
                    start_date: *start_date,
                    group_play_enabled: *group_play_enabled,
                    player_order: player_order.clone(),
                    signed_up: Vec::new(),
                };
                self.tournaments.insert(
                    tournament_id.clone(),
                    TournamentRecord {
                        config,
                        created_at: *time,
                    },
                );
            }
            Event::TournamentPlayerOrderSet {
                tournament_id,
                player_order,
                ..
            } => {
                if let Some(record) = self.record_mut(tournament_id) {
                    record.config.player_order = Some(player_order.clone());
                }
            }
            Event::TournamentSignup {
                tournament_id,
                player,
                time,
            } => {
                if let Some(record) = self.record_mut(tournament_id) {
                    if !record.config.is_signed_up(player) {
                        record.config.signed_up.push(Signup {
                            player: player.clone(),
                            time: *time,
                        });
                    }
                }
            }
            Event::TournamentSkip {
                tournament_id,
                skip_id,
                advancing_player,
                eliminated_player,
                time,
            } => self.skips.entry(tournament_id.clone()).or_default().push(SkippedGame {
                skip_id: *skip_id,
                advancing_player: advancing_player.clone(),
                eliminated_player: eliminated_player.clone(),
                time: *time,
            }),
        }
    }

    fn record_mut(&mut self, id: &TournamentId) -> Option<&mut TournamentRecord> {
        let record = self.tournaments.get_mut(id);
        if record.is_none() {
            log::debug!("event for unknown tournament {}", id);
        }
        record
    }

    pub fn tournament(&self, id: &str) -> Option<&TournamentRecord> {
        self.tournaments.get(id)
    }

    pub fn skips_for(&self, id: &str) -> Vec<SkippedGame> {
        self.skips.get(id).cloned().unwrap_or_default()
    }
}
