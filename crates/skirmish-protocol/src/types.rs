//! Identity and game types shared by every layer.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected client.
///
/// Assigned by the server when the connection is accepted and echoed
/// back to the client in the `joined` confirmation. Peers use it as the
/// `to` address of offers and answers, so on the wire it is a plain
/// string (`#[serde(transparent)]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Generates a fresh identifier: 128 random bits as 32 lowercase
    /// hex characters.
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::rng().random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The join key of a room.
///
/// Rooms are named by whatever string the first joiner supplies; the
/// server never validates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Choice
// ---------------------------------------------------------------------------

/// A move in one round of the elimination game.
///
/// On the wire a choice is its discriminant: `0` = none, `1` = rock,
/// `2` = paper, `3` = scissors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Choice {
    /// No move submitted yet this round.
    #[default]
    None = 0,
    Rock = 1,
    Paper = 2,
    Scissors = 3,
}

impl Choice {
    /// Returns `true` if a move has been submitted.
    pub fn is_some(self) -> bool {
        self != Self::None
    }

    /// Returns `true` if `self` defeats `other`.
    ///
    /// Paper beats rock, scissors beat paper, rock beats scissors.
    /// `None` neither beats nor loses to anything.
    pub fn beats(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Paper, Self::Rock) | (Self::Scissors, Self::Paper) | (Self::Rock, Self::Scissors)
        )
    }
}

impl TryFrom<u64> for Choice {
    type Error = u64;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Rock),
            2 => Ok(Self::Paper),
            3 => Ok(Self::Scissors),
            other => Err(other),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Rock => write!(f, "rock"),
            Self::Paper => write!(f, "paper"),
            Self::Scissors => write!(f, "scissors"),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies which room members receive an outbound message.
///
/// Room operations produce `(Recipient, ServerMessage)` pairs while
/// holding the room lock; the pairs are resolved to member channels and
/// pushed into them before the lock is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every current member.
    All,

    /// One specific member. Dropped if they are not in the room.
    Client(ClientId),

    /// Every member except the given one.
    AllExcept(ClientId),
}
