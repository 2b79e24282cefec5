//! Result propagation: apply a finished knockout game and move the winner forward.

use crate::models::{
    Bracket, BracketMatch, CompetitionId, FinalsError, MatchKey, Round, Slot, SlotTeam,
};
use crate::store::BracketStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Completion event raised by the scheduling calendar for a tagged fixture.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchResultEvent {
    /// Calendar event id, kept on the match for traceability.
    pub event_id: String,
    pub competition: CompetitionId,
    pub round: Round,
    pub match_number: u8,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub completed: bool,
}

impl MatchResultEvent {
    pub fn key(&self) -> MatchKey {
        MatchKey::new(self.round, self.match_number)
    }
}

/// Extension point for knockout games that end level.
///
/// Returning `None` leaves the match without a winner and stops the branch until
/// someone calls [`resolve_draw`]. Penalty shootouts or other rules plug in here.
pub trait DrawResolver {
    fn resolve(&self, game: &BracketMatch) -> Option<Slot>;
}

/// Default policy: draws wait for an administrator.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManualResolution;

impl DrawResolver for ManualResolution {
    fn resolve(&self, _game: &BracketMatch) -> Option<Slot> {
        None
    }
}

/// What a result event did to the bracket.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Propagation {
    /// Event not completed or missing a score.
    Ignored,
    /// No bracket match with that round and number (stale or unrelated event).
    NotInBracket,
    /// Scores recorded, level, no winner.
    Drawn { round: Round, match_number: u8 },
    /// Winner written into the linked slot.
    Advanced {
        winner: SlotTeam,
        next: MatchKey,
        slot: Slot,
    },
    /// Winner recorded but the linked match is gone.
    NextMatchMissing { winner: SlotTeam, next: MatchKey },
    /// Winner recorded on a non-final match that has no forward link.
    Unlinked { winner: SlotTeam },
    /// Final decided.
    Champion { winner: SlotTeam },
}

fn decide(home: u32, away: u32) -> Option<Slot> {
    if home > away {
        Some(Slot::Home)
    } else if away > home {
        Some(Slot::Away)
    } else {
        None
    }
}

/// Apply a result with the default (manual) draw policy.
pub fn apply_result<S: BracketStore>(
    store: &S,
    event: &MatchResultEvent,
) -> Result<Propagation, FinalsError> {
    apply_result_with(store, event, &ManualResolution)
}

/// Record the score on the bracket match and propagate its winner.
///
/// The whole read-modify-write runs in one store transaction. Re-applying the same
/// event gives the same bracket.
pub fn apply_result_with<S, D>(
    store: &S,
    event: &MatchResultEvent,
    resolver: &D,
) -> Result<Propagation, FinalsError>
where
    S: BracketStore,
    D: DrawResolver + ?Sized,
{
    let (home_score, away_score) = match (event.completed, event.home_score, event.away_score) {
        (true, Some(h), Some(a)) => (h, a),
        _ => {
            log::debug!("Ignoring unfinished event {} for '{}'", event.event_id, event.competition);
            return Ok(Propagation::Ignored);
        }
    };
    let key = event.key();

    let competition = event.competition.as_str();
    store.update_bracket(competition, |bracket: &mut Bracket| -> Result<_, FinalsError> {
        let Some(game) = bracket.get(key) else {
            log::info!(
                "Event {}: no {} #{} in bracket of '{}'",
                event.event_id,
                key.round,
                key.match_number,
                event.competition
            );
            return Ok(Propagation::NotInBracket);
        };

        // Same score again: the stored winner (possibly picked by hand) stands.
        let replay = game.completed
            && game.home_score == Some(home_score)
            && game.away_score == Some(away_score);
        if replay && game.winner.is_some() {
            log::debug!("Event {} replays {} #{}", event.event_id, key.round, key.match_number);
            return Ok(advance(bracket, key));
        }

        let previous_winner = game.winner.clone();
        let mut scored = game.clone();
        scored.home_score = Some(home_score);
        scored.away_score = Some(away_score);
        scored.completed = true;
        let winner_slot = decide(home_score, away_score).or_else(|| resolver.resolve(&scored));

        let winner = match winner_slot {
            Some(slot) => Some(game.team(slot).cloned().ok_or(FinalsError::MatchNotSeeded {
                round: key.round,
                match_number: key.match_number,
            })?),
            None => None,
        };
        check_downstream(bracket, key, winner.as_ref())?;

        let game = bracket.get_mut(key).ok_or(FinalsError::MatchNotFound {
            round: key.round,
            match_number: key.match_number,
        })?;
        game.home_score = Some(home_score);
        game.away_score = Some(away_score);
        game.completed = true;
        game.winner = winner;
        game.propagated = false;
        game.external_event_id = Some(event.event_id.clone());
        game.updated_at = Utc::now();

        if game.winner.is_none() {
            log::warn!(
                "{} #{} of '{}' ended {}-{}; waiting for a manual decision",
                key.round,
                key.match_number,
                event.competition,
                home_score,
                away_score
            );
            if let Some(stale) = previous_winner {
                clear_forward(bracket, key, &stale);
            }
            return Ok(Propagation::Drawn {
                round: key.round,
                match_number: key.match_number,
            });
        }
        Ok(advance(bracket, key))
    })?
}

/// Pick the winner of a drawn match by hand and propagate it.
pub fn resolve_draw<S: BracketStore>(
    store: &S,
    competition: &str,
    key: MatchKey,
    slot: Slot,
) -> Result<Propagation, FinalsError> {
    store.update_bracket(competition, |bracket: &mut Bracket| -> Result<_, FinalsError> {
        let game = bracket.get(key).ok_or(FinalsError::MatchNotFound {
            round: key.round,
            match_number: key.match_number,
        })?;
        if !game.completed {
            return Err(FinalsError::MatchNotCompleted {
                round: key.round,
                match_number: key.match_number,
            });
        }
        if !game.is_drawn() {
            return Err(FinalsError::NotADraw {
                round: key.round,
                match_number: key.match_number,
            });
        }
        let winner = game.team(slot).cloned().ok_or(FinalsError::MatchNotSeeded {
            round: key.round,
            match_number: key.match_number,
        })?;
        check_downstream(bracket, key, Some(&winner))?;

        log::info!(
            "{} #{} of '{}' decided by hand for {}",
            key.round,
            key.match_number,
            competition,
            winner.name
        );
        if let Some(game) = bracket.get_mut(key) {
            game.winner = Some(winner);
            game.updated_at = Utc::now();
        }
        Ok(advance(bracket, key))
    })?
}

/// Refuse to change who sits in a slot of a match that already has a result.
fn check_downstream(
    bracket: &Bracket,
    key: MatchKey,
    winner: Option<&SlotTeam>,
) -> Result<(), FinalsError> {
    let Some((next, slot)) = bracket.get(key).and_then(BracketMatch::next) else {
        return Ok(());
    };
    match bracket.get(next) {
        Some(target) if target.completed && target.team(slot) != winner => {
            log::warn!(
                "Result for {} #{} would change {} #{}, which is already played",
                key.round,
                key.match_number,
                next.round,
                next.match_number
            );
            Err(FinalsError::DownstreamAlreadyPlayed {
                round: next.round,
                match_number: next.match_number,
            })
        }
        _ => Ok(()),
    }
}

/// Write the recorded winner of `key` into its linked slot.
fn advance(bracket: &mut Bracket, key: MatchKey) -> Propagation {
    let Some(game) = bracket.get(key) else {
        return Propagation::NotInBracket;
    };
    let Some(winner) = game.winner.clone() else {
        return Propagation::Drawn {
            round: key.round,
            match_number: key.match_number,
        };
    };
    let Some((next, slot)) = game.next() else {
        if key.round == Round::Final {
            log::info!("{} wins the final", winner.name);
            return Propagation::Champion { winner };
        }
        log::warn!("{} #{} has no forward link", key.round, key.match_number);
        return Propagation::Unlinked { winner };
    };

    match bracket.get_mut(next) {
        Some(target) => {
            if target.team(slot) != Some(&winner) {
                target.set_team(slot, Some(winner.clone()));
            }
        }
        None => {
            log::warn!(
                "{} #{} feeds {} #{} which does not exist",
                key.round,
                key.match_number,
                next.round,
                next.match_number
            );
            return Propagation::NextMatchMissing { winner, next };
        }
    }
    if let Some(game) = bracket.get_mut(key) {
        game.propagated = true;
    }
    Propagation::Advanced { winner, next, slot }
}

/// A corrected result turned a win into a draw: take the old winner back out of
/// the next match.
fn clear_forward(bracket: &mut Bracket, key: MatchKey, stale: &SlotTeam) {
    let Some((next, slot)) = bracket.get(key).and_then(BracketMatch::next) else {
        return;
    };
    if let Some(target) = bracket.get_mut(next) {
        if target.team(slot) == Some(stale) {
            target.set_team(slot, None);
        }
    }
}
