//! Data structures for the finals engine: competitions, teams, bracket matches.

mod bracket;
mod competition;
mod team;

pub use bracket::{Bracket, BracketMatch, MatchId, MatchKey, MatchState, Round, Slot, SlotTeam};
pub use competition::{Competition, CompetitionFormat, CompetitionId, FinalsError, StoreError};
pub use team::{Team, TeamId, TeamStats};
