//! Kick off finals: split the table into qualifiers and eliminated teams.

use crate::logic::standings::rank_teams;
use crate::models::{CompetitionId, FinalsError, Team, TeamId};
use crate::store::BracketStore;
use serde::Serialize;

/// Result of a kickoff, in ranking order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct KickoffSummary {
    pub competition: CompetitionId,
    /// Nominal qualifier count of the competition format.
    pub qualifier_count: usize,
    pub qualified: Vec<TeamId>,
    pub eliminated: Vec<TeamId>,
}

/// Split a ranked list: top `count` qualify, the rest are out.
pub fn select_qualifiers(ranked: &[Team], count: usize) -> (&[Team], &[Team]) {
    ranked.split_at(count.min(ranked.len()))
}

/// Mark the top N teams of the competition as qualified and everyone else as
/// eliminated. N comes from the competition format. Does not touch the bracket.
pub fn kick_off_finals<S: BracketStore>(
    store: &S,
    competition: &str,
) -> Result<KickoffSummary, FinalsError> {
    let format = store.competition(competition)?.format;
    let teams = store.teams(competition)?;
    if teams.is_empty() {
        log::warn!("Kickoff for '{}' aborted: no teams", competition);
        return Err(FinalsError::NoTeams(competition.to_string()));
    }

    let count = format.qualifier_count();
    if teams.len() < count {
        log::warn!(
            "Competition '{}' has {} teams, fewer than {} qualifiers; all teams qualify",
            competition,
            teams.len(),
            count
        );
    }

    let ranked = rank_teams(&teams, None);
    let (qualified, eliminated) = select_qualifiers(&ranked, count);

    let flags: Vec<(TeamId, bool)> = qualified
        .iter()
        .map(|t| (t.id, false))
        .chain(eliminated.iter().map(|t| (t.id, true)))
        .collect();
    store.write_elimination(competition, &flags)?;

    log::info!(
        "Finals kicked off for '{}': {} qualified, {} eliminated",
        competition,
        qualified.len(),
        eliminated.len()
    );
    Ok(KickoffSummary {
        competition: competition.to_string(),
        qualifier_count: count,
        qualified: qualified.iter().map(|t| t.id).collect(),
        eliminated: eliminated.iter().map(|t| t.id).collect(),
    })
}
