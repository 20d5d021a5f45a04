use std::time::Duration;

use bytes::BytesMut;
use relaylink_transport::ByteStream;
use tracing::{debug, trace};

use crate::checksum::Checksum;
use crate::codec::{encode_frame, trailer_len, validate_length, wire_size, END_BYTE, MAX_PAYLOAD, START_BYTE};
use crate::deadline::Deadline;
use crate::error::{FrameError, Phase, Result};
use crate::registers::{RegisterStore, REGISTER_COUNT};

/// Receive timeout used on the host side.
///
/// The peripheral runs with roughly 10 ms; the host allows for USB-serial
/// adapter latency on top of that.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Budget for each wait phase of [`Session::decode`]. Default: 100 ms.
    pub timeout: Duration,
    /// Integrity check shared with the peer. Default: CRC-8.
    pub checksum: Checksum,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_RECEIVE_TIMEOUT,
            checksum: Checksum::default(),
        }
    }
}

/// A validated frame, already applied to the incoming store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    payload: [u8; MAX_PAYLOAD],
    len: usize,
    /// Checksum byte carried by the frame.
    pub checksum: u8,
    /// Pairs written to the incoming store.
    pub applied: usize,
    /// Pairs skipped because their id was out of range.
    pub dropped: usize,
}

impl Received {
    /// Raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.len]
    }

    /// The `(id, value)` pairs in wire order.
    pub fn pairs(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.payload().chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }

    /// Number of pairs in the frame.
    pub fn pair_count(&self) -> usize {
        self.len / 2
    }
}

/// One end of a relaylink connection.
///
/// Pairs a byte stream with the codec state: receive timeout, checksum
/// strategy and the incoming/outgoing register stores. Pass `&mut stream` to
/// keep ownership of the stream outside the session.
///
/// Not meant to be driven from several threads at once; `decode` and
/// `encode` take `&mut self`.
pub struct Session<S> {
    stream: S,
    config: SessionConfig,
    last_checksum: u8,
    incoming: RegisterStore,
    outgoing: RegisterStore,
    buf: BytesMut,
}

impl<S: ByteStream> Session<S> {
    /// Create a session with default configuration.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, SessionConfig::default())
    }

    /// Create a session with explicit configuration.
    pub fn with_config(stream: S, config: SessionConfig) -> Self {
        Self {
            stream,
            config,
            last_checksum: 0,
            incoming: RegisterStore::new(),
            outgoing: RegisterStore::new(),
            buf: BytesMut::with_capacity(wire_size(REGISTER_COUNT)),
        }
    }

    /// Send the first `count` outgoing registers as one frame.
    ///
    /// Fails with [`FrameError::EncodeLength`] without writing anything when
    /// `count` exceeds the store. No acknowledgement is awaited.
    pub fn encode(&mut self, count: usize) -> Result<()> {
        self.buf.clear();
        let checksum = encode_frame(&self.outgoing, count, self.config.checksum, &mut self.buf)?;
        self.last_checksum = checksum;

        self.stream.write_bytes(&self.buf)?;
        self.stream.flush()?;
        debug!(count, checksum, "sent frame");
        Ok(())
    }

    /// Copy `values` to the start of the outgoing store and send them.
    pub fn send_values(&mut self, values: &[u8]) -> Result<()> {
        if values.len() > REGISTER_COUNT {
            return Err(FrameError::EncodeLength {
                requested: values.len(),
                capacity: REGISTER_COUNT,
            });
        }
        self.outgoing.write_at(0, values)?;
        self.encode(values.len())
    }

    /// Try to receive one frame from what the stream has buffered.
    ///
    /// Returns `Ok(None)` straight away when no bytes are buffered. Otherwise
    /// each wait is bounded by the session timeout, re-armed per phase:
    ///
    /// 1. discard buffered bytes up to the start sentinel (never waits);
    /// 2. wait for the length byte and validate it;
    /// 3. wait for payload, checksum and end sentinel;
    /// 4. verify checksum and end sentinel, then apply the pairs.
    ///
    /// The incoming store is only touched after every check passed. Bytes
    /// consumed by a failed attempt are gone.
    pub fn decode(&mut self) -> Result<Option<Received>> {
        if self.stream.available()? == 0 {
            return Ok(None);
        }

        self.synchronize()?;

        self.wait_available(1, Phase::Length)?;
        let length = validate_length(self.stream.read_byte()?)?;

        self.wait_available(trailer_len(length), Phase::Body)?;

        let mut payload = [0u8; MAX_PAYLOAD];
        for slot in payload[..length].iter_mut() {
            *slot = self.stream.read_byte()?;
        }

        let expected = self.config.checksum.compute(&payload[..length]);
        self.last_checksum = expected;
        let received = self.stream.read_byte()?;
        if received != expected {
            return Err(FrameError::Checksum { expected, received });
        }

        let end = self.stream.read_byte()?;
        if end != END_BYTE {
            return Err(FrameError::EndSentinel { received: end });
        }

        let outcome = self.incoming.apply_pairs(&payload[..length]);
        debug!(
            length,
            checksum = received,
            applied = outcome.applied,
            dropped = outcome.dropped,
            "received frame"
        );

        Ok(Some(Received {
            payload,
            len: length,
            checksum: received,
            applied: outcome.applied,
            dropped: outcome.dropped,
        }))
    }

    /// Poll [`decode`](Session::decode) until a frame arrives or `budget`
    /// runs out.
    ///
    /// Frame-local errors are logged and polling continues; transport errors
    /// end the wait.
    pub fn wait_for_frame(&mut self, budget: Duration) -> Result<Received> {
        let deadline = Deadline::start(budget);
        loop {
            match self.decode() {
                Ok(Some(received)) => return Ok(received),
                Ok(None) => {}
                Err(err) if err.is_frame_local() => {
                    debug!(error = %err, kind = err.kind(), "discarded frame attempt");
                }
                Err(err) => return Err(err),
            }

            if deadline.expired() {
                return Err(FrameError::Timeout {
                    phase: Phase::Response,
                    waited: deadline.elapsed(),
                });
            }
            std::thread::yield_now();
        }
    }

    fn synchronize(&mut self) -> Result<()> {
        let deadline = Deadline::start(self.config.timeout);
        let mut discarded = 0usize;

        while self.stream.available()? > 0 {
            if self.stream.read_byte()? == START_BYTE {
                if discarded > 0 {
                    trace!(discarded, "skipped bytes before start sentinel");
                }
                return Ok(());
            }
            discarded += 1;

            if deadline.expired() {
                return Err(FrameError::Timeout {
                    phase: Phase::Synchronize,
                    waited: deadline.elapsed(),
                });
            }
        }

        trace!(discarded, "no start sentinel in buffered bytes");
        Err(FrameError::Framing { discarded })
    }

    fn wait_available(&mut self, needed: usize, phase: Phase) -> Result<()> {
        let deadline = Deadline::start(self.config.timeout);
        loop {
            if self.stream.available()? >= needed {
                return Ok(());
            }
            if deadline.expired() {
                return Err(FrameError::Timeout {
                    phase,
                    waited: deadline.elapsed(),
                });
            }
            std::hint::spin_loop();
        }
    }
}

impl<S> Session<S> {
    /// Registers filled by received frames.
    pub fn incoming(&self) -> &RegisterStore {
        &self.incoming
    }

    /// Registers that [`encode`](Session::encode) sends.
    pub fn outgoing(&self) -> &RegisterStore {
        &self.outgoing
    }

    /// Mutable access to the outgoing registers.
    pub fn outgoing_mut(&mut self) -> &mut RegisterStore {
        &mut self.outgoing
    }

    /// Change the per-phase receive timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn checksum(&self) -> Checksum {
        self.config.checksum
    }

    /// Checksum of the last frame sent, or computed for the last frame
    /// received.
    pub fn last_checksum(&self) -> u8 {
        self.last_checksum
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consume the session and return the inner stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("last_checksum", &self.last_checksum)
            .finish_non_exhaustive()
    }
}
