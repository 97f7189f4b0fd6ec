//! Round resolution for the elimination game.
//!
//! Pure functions over `(ClientId, Choice)` pairs; the room applies the
//! resulting [`Round`] to its state under its own lock.

use std::collections::BTreeMap;

use skirmish_protocol::{Choice, ClientId};

use crate::RoomError;

/// The result of one round of simultaneous moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Round {
    /// Everyone played the same move, or all three moves were played.
    /// Nobody is eliminated.
    Draw,

    /// Exactly two moves were played; the dominant move survives.
    Elimination {
        /// The move that won the round.
        winning: Choice,
        /// Players of the winning move, sorted.
        winners: Vec<ClientId>,
        /// Players of the losing move, sorted.
        losers: Vec<ClientId>,
    },
}

/// Resolves one round from every active player's move.
///
/// # Errors
/// Returns [`RoomError::Invariant`] if a player has not moved yet or the
/// number of distinct moves is outside `1..=3`.
pub fn resolve<I>(picks: I) -> Result<Round, RoomError>
where
    I: IntoIterator<Item = (ClientId, Choice)>,
{
    let mut groups: BTreeMap<Choice, Vec<ClientId>> = BTreeMap::new();
    for (client, choice) in picks {
        if !choice.is_some() {
            return Err(RoomError::Invariant(format!(
                "round resolved before {client} moved"
            )));
        }
        groups.entry(choice).or_default().push(client);
    }

    match groups.len() {
        1 | 3 => Ok(Round::Draw),
        2 => {
            let mut moves = groups.into_iter();
            let (Some((a, a_players)), Some((b, b_players))) = (moves.next(), moves.next()) else {
                return Err(RoomError::Invariant("two move groups expected".into()));
            };
            let (winning, mut winners, mut losers) = if a.beats(b) {
                (a, a_players, b_players)
            } else {
                (b, b_players, a_players)
            };
            winners.sort();
            losers.sort();
            Ok(Round::Elimination {
                winning,
                winners,
                losers,
            })
        }
        k => Err(RoomError::Invariant(format!("{k} distinct moves in one round"))),
    }
}
