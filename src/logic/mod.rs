//! Finals business logic: standings, qualifiers, bracket building, result propagation.

mod bracket_builder;
mod bracket_view;
mod propagation;
mod qualifiers;
mod standings;

pub use bracket_builder::{build_bracket, next_link, plan_bracket, BracketSize, BuildSummary, Seed};
pub use bracket_view::{bracket_view, champion, BracketView, MatchView, RoundView, TBD};
pub use propagation::{
    apply_result, apply_result_with, resolve_draw, DrawResolver, ManualResolution, MatchResultEvent,
    Propagation,
};
pub use qualifiers::{kick_off_finals, select_qualifiers, KickoffSummary};
pub use standings::{compare_merit, rank_teams, standings, StandingRow};
