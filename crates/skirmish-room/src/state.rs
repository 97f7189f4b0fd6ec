//! Room lifecycle state.

/// The lifecycle state of a room's tournament.
///
/// ```text
///            all ready                 final win
/// Waiting ─────────────→ Playing ─────────────────→ Waiting
///                        ↺ draw / partial elimination
/// ```
///
/// - **Waiting**: no tournament running, no active-player subset.
///   Members ready up with `fight`.
/// - **Playing**: an active-player subset exists and rounds are being
///   resolved. Late joiners are spectators until the next game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoomState {
    #[default]
    Waiting,
    Playing,
}

impl RoomState {
    /// Returns `true` while a tournament is running.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Playing => write!(f, "Playing"),
        }
    }
}
