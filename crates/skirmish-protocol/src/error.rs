//! Error types for the protocol layer.
//!
//! Each crate in Skirmish defines its own error enum. When you see a
//! `ProtocolError`, the problem is in turning frames into messages (or
//! back), not in networking or room management.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, a frame that is not a JSON object,
    /// or truncated messages.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message carries a recognized kind but its fields have the
    /// wrong shape, e.g. a `join` whose value is not a string or a
    /// `shoot` outside `0..=3`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The object carries none of the recognized kind-fields.
    #[error("message has no recognized kind")]
    UnknownKind,
}

impl ProtocolError {
    /// Returns `true` if the offending connection must be torn down.
    ///
    /// Undecodable and malformed frames are terminal; an object that
    /// simply names no known kind is dropped and the connection kept.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::UnknownKind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_is_not_terminal() {
        assert!(!ProtocolError::UnknownKind.is_terminal());
    }

    #[test]
    fn test_malformed_payloads_are_terminal() {
        assert!(ProtocolError::InvalidMessage("bad".into()).is_terminal());

        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(ProtocolError::Decode(err).is_terminal());
    }
}
