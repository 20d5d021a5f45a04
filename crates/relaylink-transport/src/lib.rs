//! Byte-stream abstraction for relaylink.
//!
//! The frame layer only needs four primitives from the link: how many bytes
//! are buffered, read one byte, write a buffer, and flush. This crate defines
//! that contract as [`ByteStream`] and provides:
//! - [`SerialStream`] for a real serial device (8N1, no flow control)
//! - [`MemoryStream`] for loopback and cross-connected in-memory links
//!
//! This is the lowest layer of relaylink. Everything else builds on top of
//! the [`ByteStream`] trait provided here.

pub mod error;
pub mod memory;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemoryStream;
pub use serial::{
    list_ports, PortInfo, SerialConfig, SerialStream, DEFAULT_BAUD_RATE, DEFAULT_WRITE_TIMEOUT,
};
pub use traits::ByteStream;
