//! League finals engine: library with models, store and business logic.

pub mod config;
pub mod logic;
pub mod models;
pub mod roster;
pub mod store;

pub use logic::{
    apply_result, apply_result_with, bracket_view, build_bracket, champion, kick_off_finals,
    rank_teams, resolve_draw, standings, BracketSize, BracketView, BuildSummary, DrawResolver,
    KickoffSummary, ManualResolution, MatchResultEvent, Propagation, StandingRow,
};
pub use models::{
    Bracket, BracketMatch, Competition, CompetitionFormat, CompetitionId, FinalsError, MatchId,
    MatchKey, MatchState, Round, Slot, SlotTeam, StoreError, Team, TeamId, TeamStats,
};
pub use store::{BracketStore, MemoryStore};
