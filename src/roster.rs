//! Roster import from CSV: competitions and teams with their league stats.
//!
//! competitions: `id,name,format`
//! teams: `competition,name,division,points,played,wins,draws,losses,goals_for,goals_against`

use crate::models::{Competition, CompetitionFormat, StoreError, Team, TeamStats};
use crate::store::BracketStore;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Errors raised while importing roster files.
#[derive(Debug)]
pub enum RosterError {
    Csv(csv::Error),
    /// A row parsed but carries a value we cannot use.
    InvalidRow { line: u64, message: String },
    /// Team rows reference a competition that was not loaded.
    UnknownCompetition(String),
    Store(StoreError),
}

impl std::fmt::Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterError::Csv(e) => write!(f, "CSV error: {}", e),
            RosterError::InvalidRow { line, message } => write!(f, "Line {}: {}", line, message),
            RosterError::UnknownCompetition(id) => write!(f, "Teams reference unknown competition '{}'", id),
            RosterError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for RosterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterError::Csv(e) => Some(e),
            RosterError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for RosterError {
    fn from(e: csv::Error) -> Self {
        RosterError::Csv(e)
    }
}

impl From<StoreError> for RosterError {
    fn from(e: StoreError) -> Self {
        RosterError::Store(e)
    }
}

#[derive(Deserialize)]
struct CompetitionRecord {
    id: String,
    name: String,
    #[serde(default)]
    format: Option<String>,
}

#[derive(Deserialize)]
struct TeamRecord {
    competition: String,
    name: String,
    #[serde(default)]
    division: Option<String>,
    #[serde(default)]
    points: u32,
    #[serde(default)]
    played: u32,
    #[serde(default)]
    wins: u32,
    #[serde(default)]
    draws: u32,
    #[serde(default)]
    losses: u32,
    #[serde(default)]
    goals_for: u32,
    #[serde(default)]
    goals_against: u32,
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

pub fn read_competitions<R: Read>(input: R) -> Result<Vec<Competition>, RosterError> {
    let mut rdr = reader(input);
    let headers = rdr.headers()?.clone();
    let mut out = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row: CompetitionRecord = record.deserialize(Some(&headers))?;
        let format = match row.format.as_deref().filter(|f| !f.is_empty()) {
            Some(f) => f.parse::<CompetitionFormat>().map_err(|message| RosterError::InvalidRow {
                line: line_of(&record),
                message,
            })?,
            None => CompetitionFormat::default(),
        };
        out.push(Competition::new(row.id, row.name, format));
    }
    Ok(out)
}

pub fn read_teams<R: Read>(input: R) -> Result<Vec<Team>, RosterError> {
    let mut rdr = reader(input);
    let headers = rdr.headers()?.clone();
    let mut out = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row: TeamRecord = record.deserialize(Some(&headers))?;
        if row.name.is_empty() {
            return Err(RosterError::InvalidRow {
                line: line_of(&record),
                message: "team name is empty".to_string(),
            });
        }
        let mut team = Team::new(row.name, row.competition).with_stats(TeamStats {
            points: row.points,
            played: row.played,
            wins: row.wins,
            draws: row.draws,
            losses: row.losses,
            goals_for: row.goals_for,
            goals_against: row.goals_against,
            goal_difference: None,
        });
        team.division = row.division.filter(|d| !d.is_empty());
        out.push(team);
    }
    Ok(out)
}

/// Register competitions, then replace each one's roster with its teams (file order kept).
pub fn load_into<S: BracketStore>(
    store: &S,
    competitions: Vec<Competition>,
    teams: Vec<Team>,
) -> Result<(), RosterError> {
    let mut by_competition: HashMap<String, Vec<Team>> = HashMap::new();
    for team in teams {
        by_competition.entry(team.competition.clone()).or_default().push(team);
    }
    for c in &competitions {
        if !by_competition.contains_key(&c.id) {
            by_competition.insert(c.id.clone(), Vec::new());
        }
    }
    let known: Vec<String> = competitions.iter().map(|c| c.id.clone()).collect();
    if let Some(unknown) = by_competition.keys().find(|id| !known.contains(id)) {
        return Err(RosterError::UnknownCompetition(unknown.clone()));
    }

    for c in competitions {
        store.upsert_competition(c)?;
    }
    for (id, teams) in by_competition {
        log::info!("Loaded {} teams for '{}'", teams.len(), id);
        store.replace_teams(&id, teams)?;
    }
    Ok(())
}

/// Load both roster files into the store.
pub fn load_files<S: BracketStore>(
    store: &S,
    competitions_csv: &Path,
    teams_csv: &Path,
) -> Result<(), RosterError> {
    let competitions = read_competitions(std::fs::File::open(competitions_csv).map_err(csv::Error::from)?)?;
    let teams = read_teams(std::fs::File::open(teams_csv).map_err(csv::Error::from)?)?;
    load_into(store, competitions, teams)
}
