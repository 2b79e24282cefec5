//! Read-only bracket view for rendering, and the champion lookup.

use crate::models::{BracketMatch, CompetitionId, FinalsError, MatchState, Round, Slot, SlotTeam};
use crate::store::BracketStore;
use serde::Serialize;

/// Placeholder name shown for an empty slot.
pub const TBD: &str = "TBD";

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MatchView {
    pub match_number: u8,
    pub home: String,
    pub away: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub completed: bool,
    pub winner: Option<String>,
    pub state: MatchState,
    pub next_match_number: Option<u8>,
    pub slot_in_next_match: Option<Slot>,
}

impl MatchView {
    fn from_match(m: &BracketMatch) -> Self {
        let name = |t: &Option<SlotTeam>| t.as_ref().map_or_else(|| TBD.to_string(), |t| t.name.clone());
        Self {
            match_number: m.match_number,
            home: name(&m.home),
            away: name(&m.away),
            home_score: m.home_score,
            away_score: m.away_score,
            completed: m.completed,
            winner: m.winner.as_ref().map(|w| w.name.clone()),
            state: m.state(),
            next_match_number: m.next_match_number,
            slot_in_next_match: m.slot_in_next_match,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RoundView {
    pub round: Round,
    pub matches: Vec<MatchView>,
}

/// Whole bracket grouped by round, earliest round first.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BracketView {
    pub competition: CompetitionId,
    pub rounds: Vec<RoundView>,
    pub champion: Option<SlotTeam>,
}

pub fn bracket_view<S: BracketStore>(store: &S, competition: &str) -> Result<BracketView, FinalsError> {
    let bracket = store.bracket(competition)?;
    let rounds = bracket
        .rounds()
        .into_iter()
        .map(|round| RoundView {
            round,
            matches: bracket.round(round).map(MatchView::from_match).collect(),
        })
        .collect();
    Ok(BracketView {
        competition: competition.to_string(),
        rounds,
        champion: bracket.champion().cloned(),
    })
}

/// Winner of the final, once it has been played and decided.
pub fn champion<S: BracketStore>(store: &S, competition: &str) -> Result<Option<SlotTeam>, FinalsError> {
    Ok(store.bracket(competition)?.champion().cloned())
}
