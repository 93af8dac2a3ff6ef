//! Tournament engine: group play, brackets, the tournament aggregate, the repository and predictions.

mod bracket;
mod group_play;
mod oracle;
mod prediction;
mod projection;
mod repository;
mod tournament;

pub use bracket::Bracket;
pub use group_play::{assign_groups, compare_standings, get_group_sizes, round_robin, Group, GroupPlay};
pub use oracle::{EloOracle, Oracle, OracleFactory, PredictedFraction, DEFAULT_ELO, K_FACTOR};
pub use prediction::{
    spawn_prediction, write_csv, PredictionConfig, PredictionEngine, PredictionMessage, PredictionResult,
    PredictionWorker,
};
pub use projection::{ReadModel, TournamentRecord};
pub use repository::{merged_configs, TournamentCache, Tournaments};
pub use tournament::{
    now_millis, recent_winner_window, relevant_games, signup_window, GroupView, LayerView, PendingGame, PendingStage, Tournament,
    TournamentSummary, TournamentView, POINTS_LOSS, POINTS_SKIP, POINTS_WIN,
};
