//! Room coordination for Skirmish.
//!
//! Rooms are shared state guarded by locks: one lock for the registry,
//! one per room, never held across network I/O. Each connection task
//! calls straight into its room; outbound messages travel over the
//! client's [`ClientSender`] channel.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms on first join, deletes them when empty
//! - [`Room`]: membership, delivery, readiness, and the tournament
//! - [`RoomState`]: `Waiting` / `Playing`
//! - [`tournament::resolve`]: turns one round of moves into a [`Round`]

mod error;
mod registry;
mod room;
mod state;
pub mod tournament;

pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{ClientReceiver, ClientSender, Room};
pub use state::RoomState;
pub use tournament::Round;
