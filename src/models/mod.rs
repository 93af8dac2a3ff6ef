//! Data structures for ladder tournaments: players, games, configs and events.

mod event;
mod game;
mod player;
mod tournament;

pub use event::Event;
pub use game::{AdvanceTo, CompletedGame, GameScore, RelevantGame, Role, SkippedGame, TournamentGame};
pub use player::{GroupScore, PlayerId, Signup};
pub use tournament::{TournamentConfig, TournamentError, TournamentId, TournamentStage};
