use crate::error::Result;

/// A byte-oriented link to the peer.
///
/// Delivery is assumed ordered and lossless, but not prompt: callers poll
/// [`available`](ByteStream::available) and bound their own waits.
pub trait ByteStream {
    /// Number of bytes that can be read without waiting.
    fn available(&mut self) -> Result<usize>;

    /// Read one buffered byte.
    ///
    /// Returns `Err(TransportError::Empty)` instead of blocking when nothing
    /// is buffered.
    fn read_byte(&mut self) -> Result<u8>;

    /// Write the whole buffer to the link.
    fn write_bytes(&mut self, buf: &[u8]) -> Result<()>;

    /// Push any buffered output to the link.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: ByteStream + ?Sized> ByteStream for &mut S {
    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write_bytes(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write_bytes(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
