//! Wire protocol for Skirmish.
//!
//! This crate defines the "language" that peers and the relay speak:
//!
//! - **Types** ([`ClientId`], [`RoomId`], [`Choice`], [`Recipient`]):
//!   identities and game values shared by every layer.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): the flat JSON
//!   objects that travel on the wire, one per frame.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Room (state + delivery)
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use message::{ClientMessage, FightStatus, Kind, Outcome, ServerMessage};
pub use types::{Choice, ClientId, Recipient, RoomId};
