//! Document store contract and the in-memory implementation used by the web app.
//!
//! Every method is one transaction: readers never observe a bracket that is half
//! deleted and half written, and `update_bracket` runs its closure under the
//! write lock so read-modify-write on a target slot cannot lose updates.

use crate::models::{Bracket, BracketMatch, Competition, CompetitionId, StoreError, Team, TeamId};
use std::collections::HashMap;
use std::sync::RwLock;

pub trait BracketStore {
    fn competitions(&self) -> Result<Vec<Competition>, StoreError>;

    fn competition(&self, id: &str) -> Result<Competition, StoreError>;

    fn upsert_competition(&self, competition: Competition) -> Result<(), StoreError>;

    /// Teams of a competition in registration order.
    fn teams(&self, competition: &str) -> Result<Vec<Team>, StoreError>;

    /// Replace the roster of a competition.
    fn replace_teams(&self, competition: &str, teams: Vec<Team>) -> Result<(), StoreError>;

    /// Write the finals flag of several teams as one batch.
    fn write_elimination(&self, competition: &str, flags: &[(TeamId, bool)]) -> Result<(), StoreError>;

    /// Delete every bracket match of the competition and write `matches` in one step.
    fn replace_bracket(&self, competition: &str, matches: Vec<BracketMatch>) -> Result<(), StoreError>;

    /// Snapshot of the competition's bracket (empty if none was built).
    fn bracket(&self, competition: &str) -> Result<Bracket, StoreError>;

    /// Run `f` against the live bracket inside a single write transaction.
    fn update_bracket<R, F>(&self, competition: &str, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Bracket) -> R;
}

#[derive(Default)]
struct Collections {
    competitions: HashMap<CompetitionId, Competition>,
    /// Insertion order matters: it is the input order the ranker keeps for full ties.
    teams: HashMap<CompetitionId, Vec<Team>>,
    brackets: HashMap<CompetitionId, Bracket>,
}

impl Collections {
    fn require(&self, id: &str) -> Result<(), StoreError> {
        if self.competitions.contains_key(id) {
            Ok(())
        } else {
            Err(StoreError::CompetitionNotFound(id.to_string()))
        }
    }
}

/// In-memory store: all collections behind one lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BracketStore for MemoryStore {
    fn competitions(&self) -> Result<Vec<Competition>, StoreError> {
        let g = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut list: Vec<Competition> = g.competitions.values().cloned().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(list)
    }

    fn competition(&self, id: &str) -> Result<Competition, StoreError> {
        let g = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        g.competitions
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::CompetitionNotFound(id.to_string()))
    }

    fn upsert_competition(&self, competition: Competition) -> Result<(), StoreError> {
        let mut g = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        g.competitions.insert(competition.id.clone(), competition);
        Ok(())
    }

    fn teams(&self, competition: &str) -> Result<Vec<Team>, StoreError> {
        let g = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        g.require(competition)?;
        Ok(g.teams.get(competition).cloned().unwrap_or_default())
    }

    fn replace_teams(&self, competition: &str, teams: Vec<Team>) -> Result<(), StoreError> {
        let mut g = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        g.require(competition)?;
        let teams = teams
            .into_iter()
            .map(|mut t| {
                t.competition = competition.to_string();
                t
            })
            .collect();
        g.teams.insert(competition.to_string(), teams);
        Ok(())
    }

    fn write_elimination(&self, competition: &str, flags: &[(TeamId, bool)]) -> Result<(), StoreError> {
        let mut g = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        g.require(competition)?;
        if let Some(teams) = g.teams.get_mut(competition) {
            for team in teams.iter_mut() {
                if let Some((_, eliminated)) = flags.iter().find(|(id, _)| *id == team.id) {
                    team.eliminated = Some(*eliminated);
                }
            }
        }
        Ok(())
    }

    fn replace_bracket(&self, competition: &str, matches: Vec<BracketMatch>) -> Result<(), StoreError> {
        let mut g = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        g.require(competition)?;
        g.brackets
            .insert(competition.to_string(), Bracket::from_matches(matches));
        Ok(())
    }

    fn bracket(&self, competition: &str) -> Result<Bracket, StoreError> {
        let g = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        g.require(competition)?;
        Ok(g.brackets.get(competition).cloned().unwrap_or_default())
    }

    fn update_bracket<R, F>(&self, competition: &str, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Bracket) -> R,
    {
        let mut g = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        g.require(competition)?;
        let bracket = g.brackets.entry(competition.to_string()).or_default();
        Ok(f(bracket))
    }
}
