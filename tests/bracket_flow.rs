//! Integration tests for bracket building and result propagation.

use league_finals::{
    apply_result, bracket_view, build_bracket, champion, kick_off_finals, Bracket, BracketMatch,
    BracketSize, BracketStore, Competition, CompetitionFormat, FinalsError, MatchKey, MatchResultEvent,
    MatchState, MemoryStore, Propagation, Round, Slot, Team, TeamStats,
};
use std::sync::Arc;

/// Competition "x" with `n` teams; team "S{i}" is ranked i-th by points.
fn ranked_store(format: CompetitionFormat, n: u32) -> MemoryStore {
    let store = MemoryStore::new();
    store
        .upsert_competition(Competition::new("x", "X", format))
        .unwrap();
    let teams = (1..=n)
        .map(|i| {
            Team::new(format!("S{i}"), "x").with_stats(TeamStats {
                points: 100 - i,
                ..TeamStats::default()
            })
        })
        .collect();
    store.replace_teams("x", teams).unwrap();
    kick_off_finals(&store, "x").unwrap();
    store
}

fn result(round: Round, match_number: u8, home: u32, away: u32) -> MatchResultEvent {
    MatchResultEvent {
        event_id: format!("cal-{round}-{match_number}"),
        competition: "x".to_string(),
        round,
        match_number,
        home_score: Some(home),
        away_score: Some(away),
        completed: true,
    }
}

fn get(store: &MemoryStore, round: Round, n: u8) -> BracketMatch {
    store
        .bracket("x")
        .unwrap()
        .get(MatchKey::new(round, n))
        .cloned()
        .unwrap()
}

fn name(slot: &Option<league_finals::SlotTeam>) -> Option<&str> {
    slot.as_ref().map(|t| t.name.as_str())
}

/// Structure of a bracket without ids or timestamps.
fn shape(bracket: &Bracket) -> Vec<(MatchKey, Option<String>, Option<String>, Option<u8>, Option<Slot>)> {
    bracket
        .matches()
        .map(|m| {
            (
                m.key(),
                m.home.as_ref().map(|t| t.name.clone()),
                m.away.as_ref().map(|t| t.name.clone()),
                m.next_match_number,
                m.slot_in_next_match,
            )
        })
        .collect()
}

/// Match keys from `start` up to the final.
fn path_to_final(bracket: &Bracket, start: MatchKey) -> Vec<MatchKey> {
    let mut path = vec![start];
    let mut key = start;
    while let Some((next, _)) = bracket.get(key).and_then(BracketMatch::next) {
        path.push(next);
        key = next;
    }
    path
}

fn first_round_match_of(bracket: &Bracket, team: &str) -> MatchKey {
    bracket
        .matches()
        .find(|m| name(&m.home) == Some(team) || name(&m.away) == Some(team))
        .map(BracketMatch::key)
        .unwrap()
}

#[test]
fn sixteen_bracket_shape() {
    let store = ranked_store(CompetitionFormat::Divisional, 20);
    let summary = build_bracket(&store, "x").unwrap();
    assert_eq!(summary.size, BracketSize::Sixteen);
    assert_eq!(summary.matches, 15);

    let bracket = store.bracket("x").unwrap();
    let counts: Vec<usize> = Round::ALL.iter().map(|&r| bracket.round(r).count()).collect();
    assert_eq!(counts, vec![8, 4, 2, 1]);

    let mut incoming = std::collections::HashSet::new();
    for m in bracket.matches() {
        if m.round == Round::Final {
            assert!(m.next().is_none());
            continue;
        }
        let (next, slot) = m.next().expect("non-final match must link forward");
        assert!(bracket.get(next).is_some(), "edge target {:?} must exist", next);
        assert!(incoming.insert((next, slot)), "slot {:?}/{:?} fed twice", next, slot);
    }
    assert_eq!(incoming.len(), 14);
}

#[test]
fn eight_bracket_shape() {
    let store = ranked_store(CompetitionFormat::SingleGroup, 12);
    let summary = build_bracket(&store, "x").unwrap();
    assert_eq!(summary.size, BracketSize::Eight);
    let bracket = store.bracket("x").unwrap();
    assert_eq!(bracket.rounds(), vec![Round::QuarterFinal, Round::SemiFinal, Round::Final]);
    assert_eq!(bracket.len(), 7);
}

#[test]
fn twelve_qualifiers_fill_a_sixteen_bracket_with_open_slots() {
    let store = ranked_store(CompetitionFormat::Divisional, 20);
    let teams = store
        .teams("x")
        .unwrap()
        .into_iter()
        .enumerate()
        .map(|(i, mut t)| {
            t.eliminated = Some(i >= 12);
            t
        })
        .collect();
    store.replace_teams("x", teams).unwrap();

    let summary = build_bracket(&store, "x").unwrap();
    assert_eq!(summary.size, BracketSize::Sixteen);
    assert_eq!(summary.qualifiers, 12);
    assert_eq!(summary.matches, 15);
    assert_eq!(summary.seeds.len(), 12);

    let bracket = store.bracket("x").unwrap();
    for n in 1..=4u8 {
        let m = get(&store, Round::RoundOf16, n);
        assert_eq!(name(&m.home), Some(format!("S{n}").as_str()));
        assert!(m.away.is_none(), "R16 #{} away should be open", n);
        assert_eq!(m.state(), MatchState::PartiallySeeded);
    }
    for n in 5..=8u8 {
        let m = get(&store, Round::RoundOf16, n);
        assert_eq!(name(&m.home), Some(format!("S{n}").as_str()));
        assert_eq!(name(&m.away), Some(format!("S{}", 17 - n).as_str()));
    }
    let seeded: Vec<u32> = bracket
        .round(Round::RoundOf16)
        .flat_map(|m| [name(&m.home), name(&m.away)])
        .flatten()
        .map(seed_number)
        .collect();
    assert_eq!(seeded.len(), 12);
    assert!(seeded.iter().all(|&s| s <= 12));

    let view = bracket_view(&store, "x").unwrap();
    let r16 = &view.rounds[0];
    assert_eq!(r16.round, Round::RoundOf16);
    assert_eq!(r16.matches[0].away, league_finals::logic::TBD);
    assert_eq!(r16.matches[4].away, "S12");
}

fn seed_number(name: &str) -> u32 {
    name[1..].parse().unwrap()
}

#[test]
fn top_two_seeds_meet_only_in_final() {
    for (format, n) in [(CompetitionFormat::Divisional, 16), (CompetitionFormat::SingleGroup, 8)] {
        let store = ranked_store(format, n);
        build_bracket(&store, "x").unwrap();
        let bracket = store.bracket("x").unwrap();
        let one = path_to_final(&bracket, first_round_match_of(&bracket, "S1"));
        let two = path_to_final(&bracket, first_round_match_of(&bracket, "S2"));
        let first_shared = one.iter().find(|k| two.contains(k)).unwrap();
        assert_eq!(first_shared.round, Round::Final);
    }
}

#[test]
fn rebuild_is_idempotent() {
    let store = ranked_store(CompetitionFormat::Divisional, 16);
    build_bracket(&store, "x").unwrap();
    let first = store.bracket("x").unwrap();
    apply_result(&store, &result(Round::RoundOf16, 1, 1, 0)).unwrap();

    build_bracket(&store, "x").unwrap();
    let second = store.bracket("x").unwrap();
    assert_eq!(second.len(), 15);
    assert_eq!(shape(&first), shape(&second));
    assert!(second.matches().all(|m| !m.completed));
    assert!(second.matches().all(|m| first.matches().all(|old| old.id != m.id)));
}

#[test]
fn rebuild_honors_standings_changes_since_kickoff() {
    let store = ranked_store(CompetitionFormat::SingleGroup, 8);
    let mut teams = store.teams("x").unwrap();
    teams[7].stats.points = 500;
    store.replace_teams("x", teams).unwrap();

    build_bracket(&store, "x").unwrap();
    let qf1 = get(&store, Round::QuarterFinal, 1);
    assert_eq!(name(&qf1.home), Some("S8"));
    assert_eq!(name(&qf1.away), Some("S7"));
}

#[test]
fn build_without_qualifiers_keeps_old_bracket() {
    let store = ranked_store(CompetitionFormat::SingleGroup, 8);
    build_bracket(&store, "x").unwrap();
    let before = store.bracket("x").unwrap();

    let teams = store
        .teams("x")
        .unwrap()
        .into_iter()
        .map(|mut t| {
            t.eliminated = None;
            t
        })
        .collect();
    store.replace_teams("x", teams).unwrap();

    assert_eq!(
        build_bracket(&store, "x"),
        Err(FinalsError::NoQualifiedTeams("x".to_string()))
    );
    assert_eq!(store.bracket("x").unwrap(), before);
}

#[test]
fn propagation_touches_only_the_target_slot() {
    let store = ranked_store(CompetitionFormat::Divisional, 16);
    build_bracket(&store, "x").unwrap();
    let before = store.bracket("x").unwrap();

    let out = apply_result(&store, &result(Round::RoundOf16, 6, 0, 4)).unwrap();
    let target = MatchKey::new(Round::QuarterFinal, 3);
    assert!(matches!(out, Propagation::Advanced { next, slot: Slot::Away, .. } if next == target));

    let after = store.bracket("x").unwrap();
    let source = MatchKey::new(Round::RoundOf16, 6);
    for m in after.matches() {
        if m.key() == source || m.key() == target {
            continue;
        }
        assert_eq!(Some(m), before.get(m.key()));
    }
    let qf3 = after.get(target).unwrap();
    assert_eq!(name(&qf3.away), Some("S11"));
    assert!(qf3.home.is_none());
    let r16 = after.get(source).unwrap();
    assert_eq!(r16.external_event_id.as_deref(), Some("cal-round_of_16-6"));
    assert_eq!(r16.state(), MatchState::Propagated);
}

#[test]
fn replaying_an_event_is_harmless() {
    let store = ranked_store(CompetitionFormat::SingleGroup, 8);
    build_bracket(&store, "x").unwrap();
    let ev = result(Round::QuarterFinal, 2, 3, 0);
    apply_result(&store, &ev).unwrap();
    let once = shape(&store.bracket("x").unwrap());
    apply_result(&store, &ev).unwrap();
    assert_eq!(shape(&store.bracket("x").unwrap()), once);
}

#[test]
fn scenario_seed_one_through_a_drawn_quarterfinal() {
    let store = ranked_store(CompetitionFormat::Divisional, 16);
    build_bracket(&store, "x").unwrap();

    let r16_1 = get(&store, Round::RoundOf16, 1);
    assert_eq!(name(&r16_1.home), Some("S1"));
    assert_eq!(name(&r16_1.away), Some("S16"));

    apply_result(&store, &result(Round::RoundOf16, 1, 3, 1)).unwrap();
    assert_eq!(name(&get(&store, Round::QuarterFinal, 1).home), Some("S1"));

    apply_result(&store, &result(Round::RoundOf16, 8, 0, 1)).unwrap();
    let qf1 = get(&store, Round::QuarterFinal, 1);
    assert_eq!(name(&qf1.away), Some("S9"));
    assert_eq!(qf1.state(), MatchState::FullySeeded);

    let out = apply_result(&store, &result(Round::QuarterFinal, 1, 2, 2)).unwrap();
    assert_eq!(
        out,
        Propagation::Drawn {
            round: Round::QuarterFinal,
            match_number: 1
        }
    );
    let qf1 = get(&store, Round::QuarterFinal, 1);
    assert!(qf1.completed);
    assert!(qf1.winner.is_none());
    assert_eq!(qf1.state(), MatchState::CompletedNoWinner);
    assert!(get(&store, Round::SemiFinal, 1).home.is_none());

    let view = bracket_view(&store, "x").unwrap();
    assert_eq!(view.rounds[2].matches[0].home, "TBD");
}

#[test]
fn eight_team_run_to_a_champion() {
    let store = ranked_store(CompetitionFormat::SingleGroup, 8);
    build_bracket(&store, "x").unwrap();
    for n in 1..=4 {
        apply_result(&store, &result(Round::QuarterFinal, n, 1, 0)).unwrap();
    }
    let sf1 = get(&store, Round::SemiFinal, 1);
    assert_eq!((name(&sf1.home), name(&sf1.away)), (Some("S1"), Some("S4")));
    let sf2 = get(&store, Round::SemiFinal, 2);
    assert_eq!((name(&sf2.home), name(&sf2.away)), (Some("S2"), Some("S3")));

    apply_result(&store, &result(Round::SemiFinal, 1, 0, 2)).unwrap();
    apply_result(&store, &result(Round::SemiFinal, 2, 1, 0)).unwrap();
    assert_eq!(champion(&store, "x").unwrap(), None);

    let out = apply_result(&store, &result(Round::Final, 1, 1, 3)).unwrap();
    assert!(matches!(out, Propagation::Champion { ref winner } if winner.name == "S2"));
    assert_eq!(champion(&store, "x").unwrap().map(|t| t.name), Some("S2".to_string()));
    assert_eq!(get(&store, Round::Final, 1).state(), MatchState::WinnerDetermined);
    assert_eq!(
        bracket_view(&store, "x").unwrap().champion.map(|t| t.name),
        Some("S2".to_string())
    );
}

#[test]
fn stale_event_after_downsizing_rebuild_is_ignored() {
    let store = ranked_store(CompetitionFormat::Divisional, 16);
    build_bracket(&store, "x").unwrap();

    let teams = store
        .teams("x")
        .unwrap()
        .into_iter()
        .enumerate()
        .map(|(i, mut t)| {
            t.eliminated = Some(i >= 8);
            t
        })
        .collect();
    store.replace_teams("x", teams).unwrap();
    build_bracket(&store, "x").unwrap();

    let out = apply_result(&store, &result(Round::RoundOf16, 2, 1, 0)).unwrap();
    assert_eq!(out, Propagation::NotInBracket);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_results_fill_every_quarterfinal_slot() {
    let store = Arc::new(ranked_store(CompetitionFormat::Divisional, 16));
    build_bracket(store.as_ref(), "x").unwrap();

    let handles: Vec<_> = (1..=8u8)
        .map(|n| {
            let store = Arc::clone(&store);
            tokio::task::spawn_blocking(move || {
                apply_result(store.as_ref(), &result(Round::RoundOf16, n, 2, 1))
            })
        })
        .collect();
    for h in handles {
        assert!(matches!(h.await.unwrap(), Ok(Propagation::Advanced { .. })));
    }

    let bracket = store.bracket("x").unwrap();
    for qf in bracket.round(Round::QuarterFinal) {
        assert_eq!(qf.state(), MatchState::FullySeeded, "QF{}", qf.match_number);
    }
}
