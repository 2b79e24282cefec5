//! Knockout bracket construction from the qualifier ranking.

use crate::logic::standings::rank_teams;
use crate::models::{BracketMatch, CompetitionId, FinalsError, Round, Slot, SlotTeam, Team, TeamId};
use crate::store::BracketStore;
use serde::Serialize;

/// Supported bracket topologies.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSize {
    /// Quarterfinal, semifinal, final.
    Eight,
    /// Round of 16 through the final.
    Sixteen,
}

impl BracketSize {
    /// Topology for `qualifiers` teams. Anything above 8 gets the 16 bracket so
    /// that no qualified team is left out.
    pub fn for_qualifiers(qualifiers: usize) -> Self {
        if qualifiers > 8 {
            BracketSize::Sixteen
        } else {
            BracketSize::Eight
        }
    }

    pub fn entrants(self) -> usize {
        match self {
            BracketSize::Eight => 8,
            BracketSize::Sixteen => 16,
        }
    }

    pub fn first_round(self) -> Round {
        match self {
            BracketSize::Eight => Round::QuarterFinal,
            BracketSize::Sixteen => Round::RoundOf16,
        }
    }

    /// Rounds played, earliest first.
    pub fn rounds(self) -> &'static [Round] {
        match self {
            BracketSize::Eight => &[Round::QuarterFinal, Round::SemiFinal, Round::Final],
            BracketSize::Sixteen => &Round::ALL,
        }
    }
}

/// Where the winner of `(round, match_number)` goes: next-round match number and slot.
///
/// Pairs the outermost matches of each half so the top two seeds can only meet in
/// the final: R16 1/8, 2/7, 3/6, 4/5 feed QF 1..4; QF 1/4 feed SF1, QF 2/3 feed SF2.
pub fn next_link(round: Round, match_number: u8) -> Option<(u8, Slot)> {
    match (round, match_number) {
        (Round::RoundOf16, m @ 1..=4) => Some((m, Slot::Home)),
        (Round::RoundOf16, m @ 5..=8) => Some((9 - m, Slot::Away)),
        (Round::QuarterFinal, 1) => Some((1, Slot::Home)),
        (Round::QuarterFinal, 4) => Some((1, Slot::Away)),
        (Round::QuarterFinal, 2) => Some((2, Slot::Home)),
        (Round::QuarterFinal, 3) => Some((2, Slot::Away)),
        (Round::SemiFinal, 1) => Some((1, Slot::Home)),
        (Round::SemiFinal, 2) => Some((1, Slot::Away)),
        _ => None,
    }
}

/// A qualifier and its seed number (1 = best).
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Seed {
    pub seed: usize,
    pub team_id: TeamId,
    pub name: String,
}

/// Outcome of a (re)build.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BuildSummary {
    pub competition: CompetitionId,
    pub size: BracketSize,
    /// Number of qualified teams found; may differ from the bracket size.
    pub qualifiers: usize,
    pub matches: usize,
    pub seeds: Vec<Seed>,
}

fn slot_team(t: &Team) -> SlotTeam {
    SlotTeam {
        id: t.id,
        name: t.name.clone(),
    }
}

/// Lay out every match of the bracket for already ranked `seeds`.
///
/// First round pairs seed i with seed (size + 1 - i); seeds that do not exist leave
/// their slot empty. Later rounds are created TBD vs TBD.
pub fn plan_bracket(competition: &str, size: BracketSize, seeds: &[Team]) -> Vec<BracketMatch> {
    let entrants = size.entrants();
    let first = size.first_round();
    let mut matches = Vec::new();

    for &round in size.rounds() {
        for number in 1..=round.match_count() {
            let mut m = BracketMatch::new(competition, round, number);
            if round == first {
                let i = usize::from(number);
                m.home = seeds.get(i - 1).map(slot_team);
                m.away = seeds.get(entrants - i).map(slot_team);
            }
            if let Some((next, slot)) = next_link(round, number) {
                m.next_match_number = Some(next);
                m.slot_in_next_match = Some(slot);
            }
            matches.push(m);
        }
    }
    matches
}

/// Rebuild the bracket of a competition from its current qualifiers.
///
/// Qualifiers are re-ranked now, so table changes since kickoff count. Any prior
/// bracket is replaced in a single store transaction, so retries are safe.
pub fn build_bracket<S: BracketStore>(
    store: &S,
    competition: &str,
) -> Result<BuildSummary, FinalsError> {
    store.competition(competition)?;
    let qualified: Vec<Team> = store
        .teams(competition)?
        .into_iter()
        .filter(Team::is_qualified)
        .collect();
    if qualified.is_empty() {
        log::warn!("Bracket build for '{}' aborted: no qualified teams", competition);
        return Err(FinalsError::NoQualifiedTeams(competition.to_string()));
    }

    let mut ranked = rank_teams(&qualified, None);
    let size = BracketSize::for_qualifiers(ranked.len());
    if ranked.len() != size.entrants() {
        log::warn!(
            "Competition '{}' has {} qualifiers; building a {}-team bracket",
            competition,
            ranked.len(),
            size.entrants()
        );
    }
    ranked.truncate(size.entrants());

    let matches = plan_bracket(competition, size, &ranked);
    let count = matches.len();
    store.replace_bracket(competition, matches)?;

    log::info!(
        "Built {}-team bracket for '{}' ({} matches)",
        size.entrants(),
        competition,
        count
    );
    Ok(BuildSummary {
        competition: competition.to_string(),
        size,
        qualifiers: qualified.len(),
        matches: count,
        seeds: ranked
            .iter()
            .enumerate()
            .map(|(i, t)| Seed {
                seed: i + 1,
                team_id: t.id,
                name: t.name.clone(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bracket, MatchKey, TeamStats};

    fn seeds(n: u32) -> Vec<Team> {
        (1..=n)
            .map(|i| {
                Team::new(format!("S{i}"), "x").with_stats(TeamStats {
                    points: 100 - i,
                    ..TeamStats::default()
                })
            })
            .collect()
    }

    fn seed_of(name: &str) -> usize {
        name[1..].parse().unwrap()
    }

    #[test]
    fn sixteen_bracket_round_sizes() {
        let b = Bracket::from_matches(plan_bracket("x", BracketSize::Sixteen, &seeds(16)));
        assert_eq!(b.round(Round::RoundOf16).count(), 8);
        assert_eq!(b.round(Round::QuarterFinal).count(), 4);
        assert_eq!(b.round(Round::SemiFinal).count(), 2);
        assert_eq!(b.round(Round::Final).count(), 1);
    }

    #[test]
    fn eight_bracket_starts_at_quarterfinals() {
        let b = Bracket::from_matches(plan_bracket("x", BracketSize::Eight, &seeds(8)));
        assert_eq!(b.rounds(), vec![Round::QuarterFinal, Round::SemiFinal, Round::Final]);
        let qf4 = b.get(MatchKey::new(Round::QuarterFinal, 4)).unwrap();
        assert_eq!(qf4.home.as_ref().unwrap().name, "S4");
        assert_eq!(qf4.away.as_ref().unwrap().name, "S5");
    }

    #[test]
    fn first_round_pairs_seed_i_with_mirror() {
        let b = Bracket::from_matches(plan_bracket("x", BracketSize::Sixteen, &seeds(16)));
        for m in b.round(Round::RoundOf16) {
            let home = seed_of(&m.home.as_ref().unwrap().name);
            let away = seed_of(&m.away.as_ref().unwrap().name);
            assert_eq!(home, usize::from(m.match_number));
            assert_eq!(home + away, 17);
        }
    }

    #[test]
    fn later_rounds_start_empty() {
        let b = Bracket::from_matches(plan_bracket("x", BracketSize::Sixteen, &seeds(16)));
        for m in b.matches().filter(|m| m.round != Round::RoundOf16) {
            assert!(m.home.is_none() && m.away.is_none());
        }
    }

    #[test]
    fn missing_seeds_leave_slots_open() {
        let b = Bracket::from_matches(plan_bracket("x", BracketSize::Sixteen, &seeds(12)));
        let m1 = b.get(MatchKey::new(Round::RoundOf16, 1)).unwrap();
        assert_eq!(m1.home.as_ref().unwrap().name, "S1");
        assert!(m1.away.is_none());
        let m5 = b.get(MatchKey::new(Round::RoundOf16, 5)).unwrap();
        assert_eq!(m5.away.as_ref().unwrap().name, "S12");
    }

    #[test]
    fn links_follow_the_bracket_table() {
        assert_eq!(next_link(Round::RoundOf16, 1), Some((1, Slot::Home)));
        assert_eq!(next_link(Round::RoundOf16, 8), Some((1, Slot::Away)));
        assert_eq!(next_link(Round::RoundOf16, 3), Some((3, Slot::Home)));
        assert_eq!(next_link(Round::RoundOf16, 6), Some((3, Slot::Away)));
        assert_eq!(next_link(Round::RoundOf16, 5), Some((4, Slot::Away)));
        assert_eq!(next_link(Round::QuarterFinal, 4), Some((1, Slot::Away)));
        assert_eq!(next_link(Round::QuarterFinal, 3), Some((2, Slot::Away)));
        assert_eq!(next_link(Round::SemiFinal, 2), Some((1, Slot::Away)));
        assert_eq!(next_link(Round::Final, 1), None);
    }

    #[test]
    fn topology_choice() {
        assert_eq!(BracketSize::for_qualifiers(16), BracketSize::Sixteen);
        assert_eq!(BracketSize::for_qualifiers(20), BracketSize::Sixteen);
        assert_eq!(BracketSize::for_qualifiers(9), BracketSize::Sixteen);
        assert_eq!(BracketSize::for_qualifiers(8), BracketSize::Eight);
        assert_eq!(BracketSize::for_qualifiers(3), BracketSize::Eight);
    }
}
