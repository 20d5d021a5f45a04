//! Application messages carried in the register stores.
//!
//! A message occupies the first registers of a store as
//! `[type, body length, body...]` and is sent with
//! `encode(body length + 2)`. The peripheral answers a [`MessageType::GetStats`]
//! request with the same header followed by its state bytes.

use relaylink_frame::{FrameError, RegisterError, RegisterStore, Session, REGISTER_COUNT};
use relaylink_transport::ByteStream;
use tracing::info;

/// Type byte plus body-length byte.
pub const HEADER_LEN: usize = 2;

/// Largest body that fits next to the header.
pub const MAX_BODY: usize = REGISTER_COUNT - HEADER_LEN;

/// Message kinds understood by the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Request (and response) of relay/input state.
    GetStats = 1,
    /// Drive one relay output: body `[output, value]`.
    SetOutput = 2,
    /// Link test with an arbitrary body.
    Test = 3,
}

impl MessageType {
    pub fn name(self) -> &'static str {
        match self {
            MessageType::GetStats => "GET_STATS",
            MessageType::SetOutput => "SET_OUTPUT",
            MessageType::Test => "TEST",
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = MessageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MessageType::GetStats),
            2 => Ok(MessageType::SetOutput),
            3 => Ok(MessageType::Test),
            other => Err(MessageError::UnknownType(other)),
        }
    }
}

/// Errors building, sending or parsing a message.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("unknown message type {0}")]
    UnknownType(u8),

    #[error("message body too long ({len} bytes, max {max})")]
    BodyTooLong { len: usize, max: usize },

    #[error(transparent)]
    Register(#[from] RegisterError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// A typed message with its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageType,
    body: Vec<u8>,
}

impl Message {
    /// Build a message, rejecting bodies that do not fit the store.
    pub fn new(kind: MessageType, body: impl Into<Vec<u8>>) -> Result<Self, MessageError> {
        let body = body.into();
        if body.len() > MAX_BODY {
            return Err(MessageError::BodyTooLong {
                len: body.len(),
                max: MAX_BODY,
            });
        }
        Ok(Self { kind, body })
    }

    /// Statistics request.
    pub fn get_stats() -> Self {
        Self {
            kind: MessageType::GetStats,
            body: Vec::new(),
        }
    }

    /// Switch relay `output` on or off.
    pub fn set_output(output: u8, active: bool) -> Self {
        Self {
            kind: MessageType::SetOutput,
            body: vec![output, u8::from(active)],
        }
    }

    pub fn kind(&self) -> MessageType {
        self.kind
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Registers occupied by header and body.
    pub fn register_count(&self) -> usize {
        HEADER_LEN + self.body.len()
    }

    /// `(output, active)` for a [`MessageType::SetOutput`] message.
    pub fn as_set_output(&self) -> Option<(u8, bool)> {
        match (self.kind, self.body.as_slice()) {
            (MessageType::SetOutput, [output, value, ..]) => Some((*output, *value != 0)),
            _ => None,
        }
    }

    /// Relay state bitmask from a statistics response, bit `n` = output `n`.
    pub fn output_mask(&self) -> Option<u8> {
        match self.kind {
            MessageType::GetStats => self.body.first().copied(),
            _ => None,
        }
    }

    /// Lay the message out at the start of `store`.
    ///
    /// Returns the number of registers to encode.
    pub fn write_to(&self, store: &mut RegisterStore) -> Result<usize, MessageError> {
        store.write_at(0, &[self.kind as u8, self.body.len() as u8])?;
        store.write_at(HEADER_LEN, &self.body)?;
        Ok(self.register_count())
    }

    /// Parse a message from the start of `store`.
    pub fn read_from(store: &RegisterStore) -> Result<Self, MessageError> {
        let kind = MessageType::try_from(store.get(0)?)?;
        let len = store.get(1)? as usize;
        if len > MAX_BODY {
            return Err(MessageError::BodyTooLong { len, max: MAX_BODY });
        }
        let body = store.as_slice()[HEADER_LEN..HEADER_LEN + len].to_vec();
        Ok(Self { kind, body })
    }

    /// Write into the session's outgoing store and send one frame.
    pub fn send<S: ByteStream>(&self, session: &mut Session<S>) -> Result<(), MessageError> {
        let count = self.write_to(session.outgoing_mut())?;
        session.encode(count)?;
        info!(
            kind = self.kind.name(),
            length = self.body.len(),
            "sent message"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use relaylink_transport::MemoryStream;

    use super::*;

    #[test]
    fn set_output_layout() {
        let mut store = RegisterStore::new();
        let count = Message::set_output(3, true).write_to(&mut store).unwrap();

        assert_eq!(count, 4);
        assert_eq!(&store.as_slice()[..4], &[2, 2, 3, 1]);
    }

    #[test]
    fn get_stats_is_header_only() {
        let mut store = RegisterStore::new();
        let count = Message::get_stats().write_to(&mut store).unwrap();
        assert_eq!(count, HEADER_LEN);
        assert_eq!(&store.as_slice()[..2], &[1, 0]);
    }

    #[test]
    fn read_back_what_was_written() {
        let mut store = RegisterStore::new();
        let msg = Message::new(MessageType::Test, (20u8..30).collect::<Vec<_>>()).unwrap();
        msg.write_to(&mut store).unwrap();

        assert_eq!(Message::read_from(&store).unwrap(), msg);
    }

    #[test]
    fn rejects_oversized_body() {
        let err = Message::new(MessageType::Test, vec![0; MAX_BODY + 1]).unwrap_err();
        assert!(matches!(err, MessageError::BodyTooLong { len: 39, max: 38 }));
        assert!(Message::new(MessageType::Test, vec![0; MAX_BODY]).is_ok());
    }

    #[test]
    fn rejects_unknown_type_and_bad_length() {
        let mut store = RegisterStore::new();
        store.write_at(0, &[9, 0]).unwrap();
        assert!(matches!(
            Message::read_from(&store),
            Err(MessageError::UnknownType(9))
        ));

        store.write_at(0, &[1, 200]).unwrap();
        assert!(matches!(
            Message::read_from(&store),
            Err(MessageError::BodyTooLong { len: 200, .. })
        ));
    }

    #[test]
    fn accessors() {
        let msg = Message::set_output(1, false);
        assert_eq!(msg.as_set_output(), Some((1, false)));
        assert_eq!(msg.output_mask(), None);

        let stats = Message::new(MessageType::GetStats, vec![0b0101]).unwrap();
        assert_eq!(stats.output_mask(), Some(0b0101));
        assert_eq!(stats.as_set_output(), None);
        assert_eq!(MessageType::SetOutput.name(), "SET_OUTPUT");
    }

    #[test]
    fn request_and_response_over_link() {
        let (host_end, device_end) = MemoryStream::pair();
        let mut host = Session::new(host_end);
        let mut device = Session::new(device_end);

        Message::get_stats().send(&mut host).unwrap();
        device.decode().unwrap().expect("request frame");
        let request = Message::read_from(device.incoming()).unwrap();
        assert_eq!(request.kind(), MessageType::GetStats);

        Message::new(MessageType::GetStats, vec![0b0011, 1, 0, 0, 1])
            .unwrap()
            .send(&mut device)
            .unwrap();
        host.decode().unwrap().expect("response frame");
        let response = Message::read_from(host.incoming()).unwrap();
        assert_eq!(response.output_mask(), Some(0b0011));
        assert_eq!(response.body().len(), 5);
    }
}
