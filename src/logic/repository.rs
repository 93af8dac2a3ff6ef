//! All tournaments of the ladder, merged from the event log and the legacy config file.

use crate::logic::projection::ReadModel;
use crate::logic::tournament::{config_boundaries, PendingGame, Tournament};
use crate::models::{TournamentConfig, TournamentError, TournamentId};
use std::collections::BTreeMap;

/// Every known tournament built against one read model snapshot.
///
/// A tournament whose history is inconsistent is kept aside as a failure; the rest are unaffected.
#[derive(Clone, Debug, Default)]
pub struct Tournaments {
    tournaments: BTreeMap<TournamentId, Tournament>,
    failures: BTreeMap<TournamentId, TournamentError>,
    built_at: i64,
    /// Times at which some tournament changes without a new event.
    boundaries: Vec<i64>,
}

impl Tournaments {
    pub fn build(model: &ReadModel, legacy: &[TournamentConfig], now: i64) -> Self {
        let mut built = Self {
            built_at: now,
            ..Self::default()
        };
        for config in merged_configs(model, legacy) {
            let id = config.id.clone();
            let skips = model.skips_for(&id);
            let boundaries = config_boundaries(&config);
            match Tournament::build(config, &model.games, skips, now) {
                Ok(t) => {
                    built.boundaries.extend(t.time_boundaries());
                    built.tournaments.insert(id, t);
                }
                Err(e) => {
                    log::error!("tournament {} failed to build: {}", id, e);
                    built.boundaries.extend(boundaries);
                    built.failures.insert(id, e);
                }
            }
        }
        built
    }

    pub fn built_at(&self) -> i64 {
        self.built_at
    }

    /// Whether a build at `now` would differ only because time has passed.
    pub fn is_stale_at(&self, now: i64) -> bool {
        let (from, to) = (self.built_at.min(now), self.built_at.max(now));
        self.boundaries.iter().any(|&t| from < t && t <= to)
    }

    pub fn get(&self, id: &str) -> Option<&Tournament> {
        self.tournaments.get(id)
    }

    /// The tournament, or why it cannot be shown.
    pub fn lookup(&self, id: &str) -> Result<&Tournament, TournamentError> {
        if let Some(e) = self.failures.get(id) {
            return Err(e.clone());
        }
        self.get(id)
            .ok_or_else(|| TournamentError::UnknownTournament(id.to_string()))
    }

    pub fn failure(&self, id: &str) -> Option<&TournamentError> {
        self.failures.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tournament> {
        self.tournaments.values()
    }

    pub fn len(&self) -> usize {
        self.tournaments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tournaments.is_empty()
    }

    /// Pending games between the two players in any tournament.
    pub fn find_all_pending_games(&self, player1: &str, player2: &str) -> Vec<PendingGame> {
        self.iter()
            .filter_map(|t| t.find_pending_game(player1, player2))
            .collect()
    }

    /// Pending games of one player across all tournaments.
    pub fn find_all_pending_games_by_player(&self, player: &str) -> Vec<PendingGame> {
        self.iter().flat_map(|t| t.pending_games_for(player)).collect()
    }
}

/// Event sourced configs, plus legacy configs whose id the event log does not know.
pub fn merged_configs(model: &ReadModel, legacy: &[TournamentConfig]) -> Vec<TournamentConfig> {
    let mut configs: Vec<TournamentConfig> = model.tournaments.values().map(|r| r.config.clone()).collect();
    configs.extend(
        legacy
            .iter()
            .filter(|c| !model.tournaments.contains_key(&c.id))
            .cloned(),
    );
    configs
}

/// Memoized `Tournaments`, rebuilt after `invalidate` or once `now` crosses a stage or window boundary.
#[derive(Debug, Default)]
pub struct TournamentCache {
    legacy: Vec<TournamentConfig>,
    cached: Option<Tournaments>,
}

impl TournamentCache {
    pub fn new(legacy: Vec<TournamentConfig>) -> Self {
        Self { legacy, cached: None }
    }

    pub fn legacy(&self) -> &[TournamentConfig] {
        &self.legacy
    }

    /// The cached tournaments, building them from `model` if the cache is empty or stale at `now`.
    pub fn get(&mut self, model: &ReadModel, now: i64) -> &Tournaments {
        let stale = self.cached.as_ref().filter(|t| t.is_stale_at(now)).map(Tournaments::built_at);
        if let Some(built_at) = stale {
            log::info!("tournaments built at {} are stale at {}", built_at, now);
            self.cached = None;
        }
        let legacy = &self.legacy;
        self.cached.get_or_insert_with(|| {
            log::info!("rebuilding tournaments from {} games", model.games.len());
            Tournaments::build(model, legacy, now)
        })
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// Drop the cached tournaments; call after every accepted event.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
