//! League table: ranking teams by merit.

use crate::models::{FinalsError, Team, TeamId};
use crate::store::BracketStore;
use serde::Serialize;
use std::cmp::Ordering;

/// Merit order: points, then goal difference, then goals scored. All descending.
///
/// Teams equal on all three compare `Equal`; callers use a stable sort so they keep
/// their input order. There is no further tie-break.
pub fn compare_merit(a: &Team, b: &Team) -> Ordering {
    b.stats
        .points
        .cmp(&a.stats.points)
        .then_with(|| b.stats.goal_difference().cmp(&a.stats.goal_difference()))
        .then_with(|| b.stats.goals_for.cmp(&a.stats.goals_for))
}

/// Rank a snapshot of teams, most meritorious first. With `division`, only that
/// sub-division is ranked.
pub fn rank_teams(teams: &[Team], division: Option<&str>) -> Vec<Team> {
    let mut ranked: Vec<Team> = teams
        .iter()
        .filter(|t| division.map_or(true, |d| t.division.as_deref() == Some(d)))
        .cloned()
        .collect();
    ranked.sort_by(compare_merit);
    ranked
}

/// One line of the league table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StandingRow {
    pub position: usize,
    pub team_id: TeamId,
    pub name: String,
    pub division: Option<String>,
    pub points: u32,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
    pub eliminated: Option<bool>,
}

impl StandingRow {
    fn from_team(position: usize, t: &Team) -> Self {
        Self {
            position,
            team_id: t.id,
            name: t.name.clone(),
            division: t.division.clone(),
            points: t.stats.points,
            played: t.stats.played,
            wins: t.stats.wins,
            draws: t.stats.draws,
            losses: t.stats.losses,
            goals_for: t.stats.goals_for,
            goals_against: t.stats.goals_against,
            goal_difference: t.stats.goal_difference(),
            eliminated: t.eliminated,
        }
    }
}

/// Current table of a competition, recomputed from stored stats.
pub fn standings<S: BracketStore>(
    store: &S,
    competition: &str,
    division: Option<&str>,
) -> Result<Vec<StandingRow>, FinalsError> {
    let teams = store.teams(competition)?;
    if teams.is_empty() {
        log::info!("Standings requested for '{}' but it has no teams", competition);
    }
    Ok(rank_teams(&teams, division)
        .iter()
        .enumerate()
        .map(|(i, t)| StandingRow::from_team(i + 1, t))
        .collect())
}
