//! Competition, CompetitionFormat and the error types shared by the finals logic.

use crate::models::bracket::Round;
use serde::{Deserialize, Serialize};

/// Competition identifier, e.g. `"serie-a"`. Assigned by the registration side.
pub type CompetitionId = String;

/// Shape of the league phase; decides how many teams reach the finals.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionFormat {
    /// One round-robin table; top 8 qualify.
    #[default]
    SingleGroup,
    /// Table split into sub-divisions; top 16 overall qualify.
    Divisional,
}

impl CompetitionFormat {
    pub fn qualifier_count(self) -> usize {
        match self {
            CompetitionFormat::SingleGroup => 8,
            CompetitionFormat::Divisional => 16,
        }
    }
}

impl std::str::FromStr for CompetitionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single_group" | "single" | "league" => Ok(CompetitionFormat::SingleGroup),
            "divisional" | "divisions" => Ok(CompetitionFormat::Divisional),
            other => Err(format!("unknown competition format '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    pub id: CompetitionId,
    pub name: String,
    #[serde(default)]
    pub format: CompetitionFormat,
}

impl Competition {
    pub fn new(id: impl Into<CompetitionId>, name: impl Into<String>, format: CompetitionFormat) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            format,
        }
    }
}

/// Errors raised by the document store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreError {
    /// A previous writer panicked while holding the store lock.
    LockPoisoned,
    /// No competition with this id is registered.
    CompetitionNotFound(CompetitionId),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::LockPoisoned => write!(f, "Store lock poisoned"),
            StoreError::CompetitionNotFound(id) => write!(f, "Competition '{}' not found", id),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors that can occur during finals operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FinalsError {
    /// Competition is not registered.
    CompetitionNotFound(CompetitionId),
    /// Competition has no teams to rank.
    NoTeams(CompetitionId),
    /// Finals were not kicked off, or nobody qualified.
    NoQualifiedTeams(CompetitionId),
    /// Bracket match does not exist (manual operations only; result events treat this as a no-op).
    MatchNotFound { round: Round, match_number: u8 },
    /// The winning side of the match has no team assigned yet.
    MatchNotSeeded { round: Round, match_number: u8 },
    /// Match has no result yet.
    MatchNotCompleted { round: Round, match_number: u8 },
    /// Manual winner selection is only allowed for drawn matches.
    NotADraw { round: Round, match_number: u8 },
    /// The next match already has a result; changing who reaches it is refused.
    DownstreamAlreadyPlayed { round: Round, match_number: u8 },
    /// Round name in a request could not be parsed.
    InvalidRound(String),
    Store(StoreError),
}

impl std::fmt::Display for FinalsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinalsError::CompetitionNotFound(id) => write!(f, "Competition '{}' not found", id),
            FinalsError::NoTeams(id) => write!(f, "No teams found for competition '{}'", id),
            FinalsError::NoQualifiedTeams(id) => {
                write!(f, "No qualified teams for competition '{}'; kick off finals first", id)
            }
            FinalsError::MatchNotFound { round, match_number } => {
                write!(f, "Bracket match {} #{} not found", round, match_number)
            }
            FinalsError::MatchNotSeeded { round, match_number } => {
                write!(f, "Bracket match {} #{} is missing a team", round, match_number)
            }
            FinalsError::MatchNotCompleted { round, match_number } => {
                write!(f, "Bracket match {} #{} has no result yet", round, match_number)
            }
            FinalsError::NotADraw { round, match_number } => {
                write!(f, "Bracket match {} #{} was not drawn", round, match_number)
            }
            FinalsError::DownstreamAlreadyPlayed { round, match_number } => {
                write!(f, "Bracket match {} #{} is already played; its entrants cannot change", round, match_number)
            }
            FinalsError::InvalidRound(s) => write!(f, "Unknown round '{}'", s),
            FinalsError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for FinalsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FinalsError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for FinalsError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::CompetitionNotFound(id) => FinalsError::CompetitionNotFound(id),
            other => FinalsError::Store(other),
        }
    }
}
