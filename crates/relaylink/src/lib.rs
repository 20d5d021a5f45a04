//! Host-side serial link to relay/input peripherals.
//!
//! relaylink exchanges small register blocks with a peripheral over a
//! checksummed, sentinel-delimited serial framing.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-stream abstraction (serial port, in-memory links)
//! - [`frame`]: framing, checksums, register stores and the [`Session`](frame::Session)
//! - [`message`]: typed application messages laid out in the register stores

pub mod message;

/// Re-export transport types.
pub mod transport {
    pub use relaylink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use relaylink_frame::*;
}

pub use message::{Message, MessageError, MessageType};
