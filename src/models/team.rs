//! Team and TeamStats data structures.

use crate::models::competition::CompetitionId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a team (used in bracket slots and lookups).
pub type TeamId = Uuid;

/// League table statistics, aggregated by match recording outside this crate.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamStats {
    pub points: u32,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    /// Stored goal difference; computed from goals when absent.
    pub goal_difference: Option<i64>,
}

impl TeamStats {
    /// Stored goal difference, or `goals_for - goals_against`.
    pub fn goal_difference(&self) -> i64 {
        self.goal_difference
            .unwrap_or(i64::from(self.goals_for) - i64::from(self.goals_against))
    }
}

/// A registered team. Read-only here except for `eliminated`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub competition: CompetitionId,
    /// Sub-division (group) inside the competition, if any.
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub stats: TeamStats,
    /// `None` until finals kick off, then `Some(false)` = qualified, `Some(true)` = eliminated.
    #[serde(default)]
    pub eliminated: Option<bool>,
}

impl Team {
    /// Create a team with empty stats and no finals flag.
    pub fn new(name: impl Into<String>, competition: impl Into<CompetitionId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            competition: competition.into(),
            division: None,
            stats: TeamStats::default(),
            eliminated: None,
        }
    }

    pub fn with_division(mut self, division: impl Into<String>) -> Self {
        self.division = Some(division.into());
        self
    }

    pub fn with_stats(mut self, stats: TeamStats) -> Self {
        self.stats = stats;
        self
    }

    /// True once finals have kicked off and this team made the cut.
    pub fn is_qualified(&self) -> bool {
        self.eliminated == Some(false)
    }
}
