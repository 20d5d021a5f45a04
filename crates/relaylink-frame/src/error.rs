use std::fmt;
use std::time::Duration;

use relaylink_transport::TransportError;

/// Register index outside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    #[error("register index {index} out of range (capacity {capacity})")]
    IndexOutOfRange { index: usize, capacity: usize },
}

/// The decode step that ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Scanning buffered bytes for the start sentinel.
    Synchronize,
    /// Waiting for the length byte.
    Length,
    /// Waiting for payload, checksum and end sentinel.
    Body,
    /// Waiting for a whole response frame.
    Response,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Synchronize => "synchronize",
            Phase::Length => "length",
            Phase::Body => "body",
            Phase::Response => "response",
        })
    }
}

/// Errors that can occur during frame encoding/decoding.
///
/// Everything except [`FrameError::Transport`] is local to one frame attempt;
/// the session stays usable and the caller simply tries again.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Buffered bytes ran out before a start sentinel was seen.
    #[error("no start sentinel in {discarded} buffered bytes")]
    Framing { discarded: usize },

    /// The length byte is odd or larger than the register capacity allows.
    #[error("invalid payload length {length} (must be even and at most {max})")]
    PayloadLength { length: u8, max: usize },

    /// A wait exceeded the receive timeout.
    #[error("timed out in {phase} phase after {waited:?}")]
    Timeout { phase: Phase, waited: Duration },

    /// The checksum byte does not match the payload.
    #[error("checksum mismatch (computed {expected:#04x}, received {received:#04x})")]
    Checksum { expected: u8, received: u8 },

    /// The byte after the checksum is not the end sentinel.
    #[error("expected end sentinel, found {received:#04x}")]
    EndSentinel { received: u8 },

    /// More entries were requested for sending than the store holds.
    #[error("cannot send {requested} registers (capacity {capacity})")]
    EncodeLength { requested: usize, capacity: usize },

    /// Register access failed.
    #[error(transparent)]
    Register(#[from] RegisterError),

    /// The underlying byte stream failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl FrameError {
    /// True for protocol errors confined to one frame attempt.
    ///
    /// Transport failures are the only errors that say the link itself is
    /// unusable.
    pub fn is_frame_local(&self) -> bool {
        !matches!(self, FrameError::Transport(_))
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            FrameError::Framing { .. } => "framing",
            FrameError::PayloadLength { .. } => "payload_length",
            FrameError::Timeout { .. } => "timeout",
            FrameError::Checksum { .. } => "checksum",
            FrameError::EndSentinel { .. } => "end_sentinel",
            FrameError::EncodeLength { .. } => "encode_length",
            FrameError::Register(_) => "register",
            FrameError::Transport(_) => "transport",
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_not_frame_local() {
        assert!(!FrameError::Transport(TransportError::Closed).is_frame_local());
        assert!(FrameError::Checksum {
            expected: 1,
            received: 2
        }
        .is_frame_local());
        assert!(FrameError::Timeout {
            phase: Phase::Body,
            waited: Duration::from_millis(5)
        }
        .is_frame_local());
    }

    #[test]
    fn messages_name_the_failure() {
        let err = FrameError::Checksum {
            expected: 0xF5,
            received: 0x00,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch (computed 0xf5, received 0x00)"
        );
        assert_eq!(err.kind(), "checksum");

        let err = FrameError::Timeout {
            phase: Phase::Length,
            waited: Duration::from_millis(10),
        };
        assert!(err.to_string().contains("length phase"));
    }

    #[test]
    fn register_error_converts() {
        let err: FrameError = RegisterError::IndexOutOfRange {
            index: 40,
            capacity: 40,
        }
        .into();
        assert_eq!(err.kind(), "register");
    }
}
