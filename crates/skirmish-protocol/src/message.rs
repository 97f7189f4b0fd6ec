//! Inbound and outbound wire messages.
//!
//! Clients send flat JSON objects whose *kind* is the name of a field
//! (`{"join": "lobby"}`, `{"shoot": 2}`, ...). The server decodes each
//! frame once into a [`ClientMessage`] and routes on the variant.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Choice, ClientId, ProtocolError, RoomId};

// ---------------------------------------------------------------------------
// Kind: the recognized kind-fields, in dispatch precedence order
// ---------------------------------------------------------------------------

/// The kind-field that selected a [`ClientMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Join,
    Offer,
    Answer,
    Ice,
    Leave,
    Fight,
    Shoot,
}

impl Kind {
    /// Every kind, in the order they are tested. When a frame carries
    /// several kind-fields the first one in this list wins.
    pub const PRECEDENCE: [Kind; 7] = [
        Kind::Join,
        Kind::Offer,
        Kind::Answer,
        Kind::Ice,
        Kind::Leave,
        Kind::Fight,
        Kind::Shoot,
    ];

    /// The JSON field name for this kind.
    pub fn field(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::Ice => "ice",
            Self::Leave => "leave",
            Self::Fight => "fight",
            Self::Shoot => "shoot",
        }
    }
}

// ---------------------------------------------------------------------------
// ClientMessage: client → server
// ---------------------------------------------------------------------------

/// A decoded client frame.
///
/// Signaling variants keep the whole inbound object so it can be relayed
/// verbatim; the server never looks inside SDP or ICE payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Join (or create) the named room.
    Join { room: RoomId },

    /// Forward an SDP offer to one peer.
    Offer { to: ClientId, message: Map<String, Value> },

    /// Forward an SDP answer to one peer.
    Answer { to: ClientId, message: Map<String, Value> },

    /// Forward an ICE candidate to every other member.
    Ice { message: Map<String, Value> },

    /// Leave the current room.
    Leave,

    /// Mark self ready for the next round.
    Fight,

    /// Submit this round's move.
    Shoot { choice: Choice },
}

impl ClientMessage {
    /// Returns the kind this message was decoded from.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Join { .. } => Kind::Join,
            Self::Offer { .. } => Kind::Offer,
            Self::Answer { .. } => Kind::Answer,
            Self::Ice { .. } => Kind::Ice,
            Self::Leave => Kind::Leave,
            Self::Fight => Kind::Fight,
            Self::Shoot { .. } => Kind::Shoot,
        }
    }
}

/// Picks the kind of an inbound object and validates its fields.
///
/// A field whose value is `null` counts as absent.
///
/// # Errors
/// - [`ProtocolError::UnknownKind`] if no kind-field is present.
/// - [`ProtocolError::InvalidMessage`] if the selected kind is malformed.
impl TryFrom<Map<String, Value>> for ClientMessage {
    type Error = ProtocolError;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let kind = Kind::PRECEDENCE
            .into_iter()
            .find(|kind| object.get(kind.field()).is_some_and(|v| !v.is_null()))
            .ok_or(ProtocolError::UnknownKind)?;

        match kind {
            Kind::Join => {
                let room = object["join"]
                    .as_str()
                    .ok_or_else(|| invalid("`join` must be a string"))?;
                Ok(Self::Join {
                    room: RoomId::from(room),
                })
            }
            Kind::Offer => Ok(Self::Offer {
                to: target(&object, kind)?,
                message: object,
            }),
            Kind::Answer => Ok(Self::Answer {
                to: target(&object, kind)?,
                message: object,
            }),
            Kind::Ice => Ok(Self::Ice { message: object }),
            Kind::Leave => Ok(Self::Leave),
            Kind::Fight => Ok(Self::Fight),
            Kind::Shoot => {
                let value = &object["shoot"];
                let raw = value
                    .as_u64()
                    .or_else(|| {
                        value
                            .as_f64()
                            .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                            .map(|f| f as u64)
                    })
                    .ok_or_else(|| invalid("`shoot` must be an integer"))?;
                let choice = Choice::try_from(raw)
                    .map_err(|v| invalid(&format!("`shoot` out of range: {v}")))?;
                Ok(Self::Shoot { choice })
            }
        }
    }
}

/// Reads the `to` address of an offer or answer.
fn target(object: &Map<String, Value>, kind: Kind) -> Result<ClientId, ProtocolError> {
    object
        .get("to")
        .and_then(Value::as_str)
        .map(ClientId::from)
        .ok_or_else(|| invalid(&format!("`{}` requires a string `to`", kind.field())))
}

fn invalid(reason: &str) -> ProtocolError {
    ProtocolError::InvalidMessage(reason.to_owned())
}

// ---------------------------------------------------------------------------
// ServerMessage: server → client
// ---------------------------------------------------------------------------

/// Round-start notice carried in `{"fight": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FightStatus {
    /// Every eligible player is ready; submit moves.
    Start,
    /// Someone readied up, others still pending.
    Waiting,
}

/// Round or game outcome carried in `{"result": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Draw,
    Win,
    Lose,
    FinalWin,
}

/// A message from the server to one client.
///
/// `#[serde(untagged)]` serializes each variant as its bare fields, so
/// `Joined { joined }` becomes `{"joined": "<id>"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Confirms the receiver's own identifier after a join.
    Joined { joined: ClientId },

    /// Another client just joined the receiver's room.
    NewMember { new: ClientId },

    /// Readiness progress.
    Fight { fight: FightStatus },

    /// Round or game outcome. `winner` is only present on `final_win`.
    Result {
        result: Outcome,
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<ClientId>,
    },

    /// A signaling object relayed verbatim from another member.
    Relay(Map<String, Value>),
}

impl ServerMessage {
    pub fn joined(id: ClientId) -> Self {
        Self::Joined { joined: id }
    }

    pub fn new_member(id: ClientId) -> Self {
        Self::NewMember { new: id }
    }

    pub fn fight(status: FightStatus) -> Self {
        Self::Fight { fight: status }
    }

    /// A round outcome without a champion (`draw`, `win`, `lose`).
    pub fn outcome(result: Outcome) -> Self {
        Self::Result {
            result,
            winner: None,
        }
    }

    /// The end of a tournament.
    pub fn final_win(winner: ClientId) -> Self {
        Self::Result {
            result: Outcome::FinalWin,
            winner: Some(winner),
        }
    }
}
