use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur on a relaylink byte stream.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open or configure the serial device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: serialport::Error,
    },

    /// The serial driver reported an error on an open port.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An I/O error occurred on the stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device stopped accepting output.
    #[error("write stalled after {written} bytes ({waited:?})")]
    WriteTimeout { written: usize, waited: Duration },

    /// A byte was requested but none is buffered.
    #[error("no byte available")]
    Empty,

    /// The stream reached end-of-file or refused further writes.
    #[error("stream closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
