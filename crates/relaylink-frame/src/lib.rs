//! Checksummed serial framing with a fixed register exchange.
//!
//! Every frame on the wire is:
//! - a start sentinel (`0x7E`) for stream synchronization
//! - a one-byte payload length, always even
//! - the payload: `(id, value)` byte pairs addressing a [`RegisterStore`]
//! - a one-byte checksum over the payload ([`Checksum`])
//! - an end sentinel (`0xEF`)
//!
//! A [`Session`] binds a byte stream to the codec state and the two register
//! stores. Each `decode` call resolves at most one frame within the receive
//! timeout; nothing is half-applied.

pub mod checksum;
pub mod codec;
pub mod deadline;
pub mod error;
pub mod registers;
pub mod session;

pub use checksum::{Checksum, UnknownChecksum};
pub use codec::{encode_frame, wire_size, END_BYTE, MAX_PAYLOAD, START_BYTE};
pub use error::{FrameError, Phase, RegisterError, Result};
pub use registers::{ApplyOutcome, RegisterStore, REGISTER_COUNT};
pub use session::{Received, Session, SessionConfig, DEFAULT_RECEIVE_TIMEOUT};
