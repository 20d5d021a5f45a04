use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Result, TransportError};
use crate::traits::ByteStream;

type Buffer = Arc<Mutex<VecDeque<u8>>>;

/// In-memory byte stream.
///
/// A loopback stream reads back what it writes. A [`pair`](MemoryStream::pair)
/// gives two ends of a cross-connected link, so a host and a simulated
/// peripheral can talk to each other, possibly from different threads.
#[derive(Clone, Debug, Default)]
pub struct MemoryStream {
    rx: Buffer,
    tx: Buffer,
}

impl MemoryStream {
    /// A stream whose writes become its own readable bytes.
    pub fn loopback() -> Self {
        let buf = Buffer::default();
        Self {
            rx: Arc::clone(&buf),
            tx: buf,
        }
    }

    /// Two ends of a link: bytes written on one are readable on the other.
    pub fn pair() -> (Self, Self) {
        let a_to_b = Buffer::default();
        let b_to_a = Buffer::default();
        let a = Self {
            rx: Arc::clone(&b_to_a),
            tx: Arc::clone(&a_to_b),
        };
        let b = Self {
            rx: a_to_b,
            tx: b_to_a,
        };
        (a, b)
    }

    /// A stream pre-loaded with bytes to read.
    pub fn with_incoming(bytes: &[u8]) -> Self {
        let stream = Self::default();
        stream.push_incoming(bytes);
        stream
    }

    /// Make bytes available for reading, as if the peer had sent them.
    pub fn push_incoming(&self, bytes: &[u8]) {
        lock(&self.rx).extend(bytes.iter().copied());
    }

    /// Drain and return everything written so far and not yet read.
    pub fn take_outgoing(&self) -> Vec<u8> {
        lock(&self.tx).drain(..).collect()
    }

    /// Number of written bytes not yet consumed.
    pub fn pending_outgoing(&self) -> usize {
        lock(&self.tx).len()
    }
}

impl ByteStream for MemoryStream {
    fn available(&mut self) -> Result<usize> {
        Ok(lock(&self.rx).len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        lock(&self.rx).pop_front().ok_or(TransportError::Empty)
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        lock(&self.tx).extend(buf.iter().copied());
        Ok(())
    }
}

fn lock(buf: &Buffer) -> MutexGuard<'_, VecDeque<u8>> {
    buf.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_reads_back_writes() {
        let mut stream = MemoryStream::loopback();
        stream.write_bytes(b"abc").unwrap();

        assert_eq!(stream.available().unwrap(), 3);
        assert_eq!(stream.read_byte().unwrap(), b'a');
        assert_eq!(stream.read_byte().unwrap(), b'b');
        assert_eq!(stream.read_byte().unwrap(), b'c');
        assert!(matches!(stream.read_byte(), Err(TransportError::Empty)));
    }

    #[test]
    fn pair_is_cross_connected() {
        let (mut host, mut device) = MemoryStream::pair();
        host.write_bytes(&[0x7E, 0x00]).unwrap();

        assert_eq!(host.available().unwrap(), 0);
        assert_eq!(device.available().unwrap(), 2);
        assert_eq!(device.read_byte().unwrap(), 0x7E);

        device.write_bytes(&[0xEF]).unwrap();
        assert_eq!(host.read_byte().unwrap(), 0xEF);
    }

    #[test]
    fn push_and_take_do_not_mix_directions() {
        let stream = MemoryStream::default();
        stream.push_incoming(&[1, 2]);

        let mut reader = stream.clone();
        reader.write_bytes(&[3]).unwrap();

        assert_eq!(stream.pending_outgoing(), 1);
        assert_eq!(stream.take_outgoing(), vec![3]);
        assert_eq!(reader.available().unwrap(), 2);
    }

    #[test]
    fn clones_share_buffers_across_threads() {
        let (mut host, device) = MemoryStream::pair();
        let writer = std::thread::spawn(move || {
            let mut device = device;
            device.write_bytes(&[42; 16]).unwrap();
        });
        writer.join().unwrap();

        assert_eq!(host.available().unwrap(), 16);
        assert_eq!(host.read_byte().unwrap(), 42);
    }

    #[test]
    fn with_incoming_preloads_reads() {
        let mut stream = MemoryStream::with_incoming(&[5, 6]);
        assert_eq!(stream.read_byte().unwrap(), 5);
        assert_eq!(stream.available().unwrap(), 1);
        assert!(stream.take_outgoing().is_empty());
    }
}
