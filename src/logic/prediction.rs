//! Monte Carlo prediction of tournament winners over time.
//!
//! For every point in time where the tournament changed, the event log is cut off at that
//! point and the rest of the tournament is played out `simulation_count` times with winners
//! drawn from an [`Oracle`].

use crate::logic::oracle::{Oracle, OracleFactory, PredictedFraction};
use crate::logic::projection::ReadModel;
use crate::logic::tournament::Tournament;
use crate::models::{Event, PlayerId, TournamentConfig, TournamentError, TournamentId, TournamentStage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// Fraction drawn against when the oracle has no data for a pair.
const NO_DATA: PredictedFraction = PredictedFraction {
    fraction: 0.5,
    confidence: 0.0,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Simulations per time point.
    pub simulation_count: usize,
    /// Rounds a single simulation may take before it is considered corrupt.
    pub max_rounds: usize,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            simulation_count: 1000,
            max_rounds: 100,
            seed: None,
        }
    }
}

/// Simulated outcome distribution at one point in time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PredictionResult {
    pub time: i64,
    pub win_counts: BTreeMap<PlayerId, u32>,
    /// Mean oracle confidence over every simulated game.
    pub average_confidence: f64,
    pub simulations: usize,
}

impl PredictionResult {
    fn empty(time: i64) -> Self {
        Self {
            time,
            win_counts: BTreeMap::new(),
            average_confidence: 0.0,
            simulations: 0,
        }
    }

    /// Share of simulations won by each player.
    pub fn win_probabilities(&self) -> BTreeMap<PlayerId, f64> {
        if self.simulations == 0 {
            return BTreeMap::new();
        }
        self.win_counts
            .iter()
            .map(|(p, &wins)| (p.clone(), f64::from(wins) / self.simulations as f64))
            .collect()
    }
}

/// Progress messages streamed by a prediction run.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PredictionMessage {
    SimulationTimes { times: Vec<i64>, progress: f64 },
    Result { result: PredictionResult, progress: f64 },
    Complete,
    Failed { error: String },
}

#[derive(Debug, Default)]
struct ConfidenceTally {
    sum: f64,
    games: usize,
}

impl ConfidenceTally {
    fn add(&mut self, confidence: f64) {
        self.sum += confidence;
        self.games += 1;
    }

    /// Nothing left to simulate means the outcome is certain.
    fn average(&self) -> f64 {
        if self.games == 0 {
            1.0
        } else {
            self.sum / self.games as f64
        }
    }
}

pub struct PredictionEngine<F> {
    factory: F,
    config: PredictionConfig,
    legacy: Vec<TournamentConfig>,
    rng: StdRng,
}

impl<F: OracleFactory> PredictionEngine<F> {
    pub fn new(factory: F, config: PredictionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            factory,
            config,
            legacy: Vec::new(),
            rng,
        }
    }

    /// Also predict tournaments only known from the legacy config file.
    pub fn with_legacy(mut self, legacy: Vec<TournamentConfig>) -> Self {
        self.legacy = legacy;
        self
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Start date, every game time of the tournament, and its end (or `now`), ascending.
    pub fn simulation_times(&self, events: &[Event], tournament_id: &str, now: i64) -> Result<Vec<i64>, TournamentError> {
        let model = ReadModel::from_events(events);
        let tournament = self
            .build_tournament(&model, tournament_id, now)?
            .ok_or_else(|| TournamentError::UnknownTournament(tournament_id.to_string()))?;
        Ok(simulation_times(&tournament, now))
    }

    /// Run the whole prediction and collect every time point.
    pub fn predict(&mut self, events: &[Event], tournament_id: &str, now: i64) -> Result<Vec<PredictionResult>, TournamentError> {
        let mut results = Vec::new();
        self.predict_streaming(events, tournament_id, now, |message| {
            if let PredictionMessage::Result { result, .. } = message {
                results.push(result);
            }
            true
        })?;
        Ok(results)
    }

    /// Run the prediction, handing each message to `sink`; stops early when `sink` returns false.
    pub fn predict_streaming(
        &mut self,
        events: &[Event],
        tournament_id: &str,
        now: i64,
        mut sink: impl FnMut(PredictionMessage) -> bool,
    ) -> Result<(), TournamentError> {
        let model = ReadModel::from_events(events);
        let full = self
            .build_tournament(&model, tournament_id, now)?
            .ok_or_else(|| TournamentError::UnknownTournament(tournament_id.to_string()))?;
        let entrants = self.entrants(&model, tournament_id);
        let times = simulation_times(&full, now);
        log::info!(
            "predicting {} at {} time points with {} simulations each",
            tournament_id,
            times.len(),
            self.config.simulation_count
        );
        if !sink(PredictionMessage::SimulationTimes {
            times: times.clone(),
            progress: 0.0,
        }) {
            return Ok(());
        }

        for (i, &time) in times.iter().enumerate() {
            let result = self.predict_point(events, tournament_id, &entrants, time)?;
            let progress = (i + 1) as f64 / times.len() as f64;
            if !sink(PredictionMessage::Result { result, progress }) {
                log::debug!("prediction of {} cancelled", tournament_id);
                return Ok(());
            }
        }
        sink(PredictionMessage::Complete);
        Ok(())
    }

    /// Outcome distribution with the log cut off at `time`.
    pub fn predict_at(&mut self, events: &[Event], tournament_id: &str, time: i64) -> Result<PredictionResult, TournamentError> {
        let entrants = self.entrants(&ReadModel::from_events(events), tournament_id);
        self.predict_point(events, tournament_id, &entrants, time)
    }

    fn predict_point(
        &mut self,
        events: &[Event],
        tournament_id: &str,
        entrants: &[PlayerId],
        time: i64,
    ) -> Result<PredictionResult, TournamentError> {
        let model = ReadModel::until(events, time);
        let Some(tournament) = self.build_tournament(&model, tournament_id, time)? else {
            return Ok(PredictionResult::empty(time));
        };
        if tournament.stage == TournamentStage::NotStarted {
            return Ok(PredictionResult::empty(time));
        }

        let config = tournament.config;
        let mut seeded: Vec<Event> = entrants
            .iter()
            .map(|p| Event::PlayerCreated {
                player: p.clone(),
                time: config.start_date - 1,
            })
            .collect();
        seeded.extend(model.games.iter().map(Event::game));
        seeded.extend(model.skips_for(tournament_id).iter().map(|s| Event::skip(tournament_id, s)));

        let mut win_counts = BTreeMap::new();
        let mut tally = ConfidenceTally::default();
        for _ in 0..self.config.simulation_count {
            let champion = self.simulate(&config, &seeded, time, &mut tally)?;
            *win_counts.entry(champion).or_insert(0) += 1;
        }
        log::debug!("{} at {}: {:?}", tournament_id, time, win_counts);
        Ok(PredictionResult {
            time,
            win_counts,
            average_confidence: tally.average(),
            simulations: self.config.simulation_count,
        })
    }

    /// Play the tournament out once; returns the champion.
    fn simulate(
        &mut self,
        config: &TournamentConfig,
        seeded: &[Event],
        time: i64,
        tally: &mut ConfidenceTally,
    ) -> Result<PlayerId, TournamentError> {
        let mut events = seeded.to_vec();
        let mut clock = time;
        let mut rounds = 0;
        loop {
            let model = ReadModel::from_events(&events);
            let tournament = Tournament::build(config.clone(), &model.games, model.skips_for(&config.id), clock)?;
            if let Some(champion) = tournament.winner() {
                return Ok(champion.clone());
            }
            let pending = tournament.pending_games();
            if pending.is_empty() {
                return Err(TournamentError::SimulationStalled {
                    tournament: config.id.clone(),
                });
            }
            rounds += 1;
            if rounds > self.config.max_rounds {
                return Err(TournamentError::SimulationDiverged {
                    tournament: config.id.clone(),
                    rounds: self.config.max_rounds,
                });
            }

            clock += 1;
            let oracle = self.factory.oracle(&model);
            for game in pending.into_iter().map(|p| p.game) {
                let (Some(a), Some(b)) = (game.player1, game.player2) else {
                    continue;
                };
                let predicted = oracle.predicted_fraction(&a, &b).unwrap_or(NO_DATA);
                tally.add(predicted.confidence);
                let (winner, loser) = if self.rng.gen::<f64>() < predicted.fraction {
                    (a, b)
                } else {
                    (b, a)
                };
                events.push(Event::GameCreated {
                    winner,
                    loser,
                    played_at: clock,
                    score: None,
                });
            }
        }
    }

    fn tournament_config(&self, model: &ReadModel, tournament_id: &str) -> Option<TournamentConfig> {
        model
            .tournament(tournament_id)
            .map(|r| r.config.clone())
            .or_else(|| self.legacy.iter().find(|c| c.id == tournament_id).cloned())
    }

    /// Seed order of the tournament as the whole log knows it.
    fn entrants(&self, full: &ReadModel, tournament_id: &str) -> Vec<PlayerId> {
        self.tournament_config(full, tournament_id)
            .map(|c| c.seed_order())
            .unwrap_or_default()
    }

    fn build_tournament(&self, model: &ReadModel, tournament_id: &str, now: i64) -> Result<Option<Tournament>, TournamentError> {
        let Some(config) = self.tournament_config(model, tournament_id) else {
            return Ok(None);
        };
        Tournament::build(config, &model.games, model.skips_for(tournament_id), now).map(Some)
    }
}

fn simulation_times(tournament: &Tournament, now: i64) -> Vec<i64> {
    let group_games = tournament
        .group_play
        .iter()
        .flat_map(|gp| gp.groups.iter())
        .flat_map(|g| g.games.iter());
    let bracket_games = tournament.bracket.iter().flat_map(|b| b.layers.iter().flatten());
    let mut times: Vec<i64> = group_games
        .chain(bracket_games)
        .filter(|g| g.skipped.is_none())
        .filter_map(|g| g.completed_at)
        .collect();
    times.push(tournament.config.start_date);
    times.push(tournament.ended().unwrap_or(now));
    times.sort_unstable();
    times.dedup();
    times
}

/// A prediction running on its own thread.
///
/// Dropping the worker (or its receiver) cancels the run at the next message.
pub struct PredictionWorker {
    pub receiver: Receiver<PredictionMessage>,
    handle: JoinHandle<()>,
}

impl PredictionWorker {
    /// Block until the run finishes and return every result, or the failure.
    pub fn collect_results(self) -> Result<Vec<PredictionResult>, String> {
        let mut results = Vec::new();
        for message in self.receiver.iter() {
            match message {
                PredictionMessage::Result { result, .. } => results.push(result),
                PredictionMessage::Failed { error } => return Err(error),
                PredictionMessage::SimulationTimes { .. } | PredictionMessage::Complete => {}
            }
        }
        if self.handle.join().is_err() {
            return Err("prediction worker panicked".to_string());
        }
        Ok(results)
    }
}

/// Start a prediction on a background thread, streaming messages back over a channel.
pub fn spawn_prediction<F>(
    events: Vec<Event>,
    tournament_id: TournamentId,
    now: i64,
    config: PredictionConfig,
    legacy: Vec<TournamentConfig>,
    factory: F,
) -> PredictionWorker
where
    F: OracleFactory + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    let handle = thread::spawn(move || {
        let mut engine = PredictionEngine::new(factory, config).with_legacy(legacy);
        let run = engine.predict_streaming(&events, &tournament_id, now, |message| sender.send(message).is_ok());
        if let Err(e) = run {
            log::error!("prediction of {} failed: {}", tournament_id, e);
            let _ = sender.send(PredictionMessage::Failed { error: e.to_string() });
        }
    });
    PredictionWorker { receiver, handle }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    time: i64,
    player: &'a str,
    win_probability: f64,
    confidence: f64,
}

/// Write the series as `time,player,win_probability,confidence` rows.
pub fn write_csv<W: io::Write>(results: &[PredictionResult], writer: W) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    for result in results {
        for (player, win_probability) in result.win_probabilities() {
            csv.serialize(CsvRow {
                time: result.time,
                player: &player,
                win_probability,
                confidence: result.average_confidence,
            })?;
        }
    }
    csv.flush()?;
    Ok(())
}
