//! Knockout bracket: rounds, slots, matches and the per-competition match arena.

use crate::models::competition::CompetitionId;
use crate::models::team::TeamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique identifier for a bracket match row.
pub type MatchId = Uuid;

/// Knockout round. Ordered from earliest to the final.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum Round {
    #[serde(rename = "round_of_16")]
    RoundOf16,
    #[serde(rename = "quarterfinal")]
    QuarterFinal,
    #[serde(rename = "semifinal")]
    SemiFinal,
    #[serde(rename = "final")]
    Final,
}

impl Round {
    pub const ALL: [Round; 4] = [Round::RoundOf16, Round::QuarterFinal, Round::SemiFinal, Round::Final];

    /// Round the winners of this round move on to; `None` for the final.
    pub fn next(self) -> Option<Round> {
        match self {
            Round::RoundOf16 => Some(Round::QuarterFinal),
            Round::QuarterFinal => Some(Round::SemiFinal),
            Round::SemiFinal => Some(Round::Final),
            Round::Final => None,
        }
    }

    /// Number of matches this round has in any bracket that contains it.
    pub fn match_count(self) -> u8 {
        match self {
            Round::RoundOf16 => 8,
            Round::QuarterFinal => 4,
            Round::SemiFinal => 2,
            Round::Final => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Round::RoundOf16 => "round_of_16",
            Round::QuarterFinal => "quarterfinal",
            Round::SemiFinal => "semifinal",
            Round::Final => "final",
        }
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Round {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "round_of_16" | "r16" => Ok(Round::RoundOf16),
            "quarterfinal" | "quarter_final" | "qf" => Ok(Round::QuarterFinal),
            "semifinal" | "semi_final" | "sf" => Ok(Round::SemiFinal),
            "final" => Ok(Round::Final),
            _ => Err(s.to_string()),
        }
    }
}

/// Home or away position inside a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Home,
    Away,
}

/// Arena key: a match is addressed by its round and 1-based number.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MatchKey {
    pub round: Round,
    pub match_number: u8,
}

impl MatchKey {
    pub fn new(round: Round, match_number: u8) -> Self {
        Self { round, match_number }
    }
}

/// Team occupying a slot (id plus the display name at the time it was written).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SlotTeam {
    pub id: TeamId,
    pub name: String,
}

/// One fixture in the knockout bracket.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub id: MatchId,
    pub competition: CompetitionId,
    pub round: Round,
    pub match_number: u8,
    /// `None` = TBD.
    pub home: Option<SlotTeam>,
    pub away: Option<SlotTeam>,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub completed: bool,
    pub winner: Option<SlotTeam>,
    /// Forward edge; absent only for the final.
    pub next_match_number: Option<u8>,
    pub slot_in_next_match: Option<Slot>,
    /// Winner has been written into the linked slot of the next match.
    #[serde(default)]
    pub propagated: bool,
    /// Calendar event that carried the result.
    pub external_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BracketMatch {
    /// Empty (TBD vs TBD) match.
    pub fn new(competition: impl Into<CompetitionId>, round: Round, match_number: u8) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            competition: competition.into(),
            round,
            match_number,
            home: None,
            away: None,
            home_score: None,
            away_score: None,
            completed: false,
            winner: None,
            next_match_number: None,
            slot_in_next_match: None,
            propagated: false,
            external_event_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> MatchKey {
        MatchKey::new(self.round, self.match_number)
    }

    /// Forward edge as an arena key plus target slot.
    pub fn next(&self) -> Option<(MatchKey, Slot)> {
        let next_round = self.round.next()?;
        match (self.next_match_number, self.slot_in_next_match) {
            (Some(n), Some(slot)) => Some((MatchKey::new(next_round, n), slot)),
            _ => None,
        }
    }

    pub fn team(&self, slot: Slot) -> Option<&SlotTeam> {
        match slot {
            Slot::Home => self.home.as_ref(),
            Slot::Away => self.away.as_ref(),
        }
    }

    pub fn set_team(&mut self, slot: Slot, team: Option<SlotTeam>) {
        match slot {
            Slot::Home => self.home = team,
            Slot::Away => self.away = team,
        }
        self.updated_at = Utc::now();
    }

    pub fn is_drawn(&self) -> bool {
        self.completed && self.winner.is_none() && self.home_score.is_some() && self.home_score == self.away_score
    }

    pub fn state(&self) -> MatchState {
        if self.completed {
            return match (&self.winner, self.propagated) {
                (None, _) => MatchState::CompletedNoWinner,
                (Some(_), false) => MatchState::WinnerDetermined,
                (Some(_), true) => MatchState::Propagated,
            };
        }
        match (&self.home, &self.away) {
            (None, None) => MatchState::Empty,
            (Some(_), Some(_)) => MatchState::FullySeeded,
            _ => MatchState::PartiallySeeded,
        }
    }
}

/// Lifecycle of a bracket match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    Empty,
    PartiallySeeded,
    FullySeeded,
    CompletedNoWinner,
    /// Winner known but not written forward; terminal for the final.
    WinnerDetermined,
    /// Winner known and written forward.
    Propagated,
}

/// All bracket matches of one competition, addressed by (round, number).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Bracket {
    matches: BTreeMap<MatchKey, BracketMatch>,
}

impl Bracket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_matches(matches: impl IntoIterator<Item = BracketMatch>) -> Self {
        Self {
            matches: matches.into_iter().map(|m| (m.key(), m)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn get(&self, key: MatchKey) -> Option<&BracketMatch> {
        self.matches.get(&key)
    }

    pub fn get_mut(&mut self, key: MatchKey) -> Option<&mut BracketMatch> {
        self.matches.get_mut(&key)
    }

    /// Matches in round order, then by match number.
    pub fn matches(&self) -> impl Iterator<Item = &BracketMatch> {
        self.matches.values()
    }

    pub fn round(&self, round: Round) -> impl Iterator<Item = &BracketMatch> {
        self.matches.values().filter(move |m| m.round == round)
    }

    /// Rounds present, earliest first.
    pub fn rounds(&self) -> Vec<Round> {
        let mut rounds: Vec<Round> = self.matches.keys().map(|k| k.round).collect();
        rounds.dedup();
        rounds
    }

    pub fn final_match(&self) -> Option<&BracketMatch> {
        self.get(MatchKey::new(Round::Final, 1))
    }

    /// Winner of a completed final.
    pub fn champion(&self) -> Option<&SlotTeam> {
        self.final_match().filter(|m| m.completed).and_then(|m| m.winner.as_ref())
    }

    pub fn into_matches(self) -> Vec<BracketMatch> {
        self.matches.into_values().collect()
    }
}
