//! Ladder tournaments: group play, knockout brackets and win predictions built from an event log.

pub mod logic;
pub mod models;

pub use logic::{
    assign_groups, compare_standings, get_group_sizes, merged_configs, now_millis, round_robin, spawn_prediction,
    write_csv, Bracket, EloOracle, Group, GroupPlay, Oracle, OracleFactory, PendingGame, PendingStage,
    PredictedFraction, PredictionConfig, PredictionEngine, PredictionMessage, PredictionResult, PredictionWorker,
    ReadModel, relevant_games, Tournament, TournamentCache, TournamentSummary, TournamentView, Tournaments,
};
pub use models::{
    AdvanceTo, CompletedGame, Event, GameScore, GroupScore, PlayerId, RelevantGame, Role, Signup, SkippedGame,
    TournamentConfig, TournamentError, TournamentGame, TournamentId, TournamentStage,
};
