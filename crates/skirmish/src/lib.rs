//! # Skirmish
//!
//! A room-based WebRTC signaling relay with a built-in rock-paper-scissors
//! elimination game.
//!
//! Clients connect over WebSocket, join a named room, and exchange SDP
//! offers, answers and ICE candidates through the relay. Members of the
//! same room can ready up and play simultaneous rounds until one
//! champion is left.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! # async fn start() -> Result<(), SkirmishError> {
//! let config = ServerConfig::from_env()?;
//! let server = SkirmishServer::builder().config(config).build().await?;
//! server.run().await
//! # }
//! ```

pub mod config;
mod error;
mod handler;
mod router;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::SkirmishError;
pub use server::{SkirmishServer, SkirmishServerBuilder};

pub mod prelude {
    pub use crate::{ConfigError, ServerConfig, SkirmishError, SkirmishServer, SkirmishServerBuilder};
    pub use skirmish_protocol::{Choice, ClientId, Codec, JsonCodec, RoomId};
    pub use skirmish_room::{RoomRegistry, RoomState};
}
