use std::fmt;
use std::io;

use relaylink::MessageError;
use relaylink_frame::FrameError;
use relaylink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

fn serial_error(context: &str, err: &serialport::Error) -> CliError {
    let code = match err.kind() {
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => PERMISSION_DENIED,
        serialport::ErrorKind::InvalidInput => USAGE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { ref source, .. } => {
            let mut mapped = serial_error(context, source);
            mapped.message = format!("{context}: {err}");
            mapped
        }
        TransportError::Serial(source) => serial_error(context, &source),
        TransportError::Io(source) => io_error(context, source),
        TransportError::WriteTimeout { .. } => {
            CliError::new(TIMEOUT, format!("{context}: {err}"))
        }
        TransportError::Empty | TransportError::Closed => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(source) => transport_error(context, source),
        FrameError::Timeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        FrameError::Framing { .. }
        | FrameError::PayloadLength { .. }
        | FrameError::Checksum { .. }
        | FrameError::EndSentinel { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::EncodeLength { .. } | FrameError::Register(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}

pub fn message_error(context: &str, err: MessageError) -> CliError {
    match err {
        MessageError::Frame(err) => frame_error(context, err),
        MessageError::UnknownType(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        MessageError::BodyTooLong { .. } | MessageError::Register(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use relaylink_frame::Phase;

    use super::*;

    #[test]
    fn timeouts_map_to_timeout_code() {
        let err = frame_error(
            "receive failed",
            FrameError::Timeout {
                phase: Phase::Response,
                waited: Duration::from_secs(5),
            },
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("receive failed: "));
    }

    #[test]
    fn corrupt_frames_are_data_invalid() {
        let err = frame_error(
            "decode failed",
            FrameError::Checksum {
                expected: 1,
                received: 2,
            },
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn nested_errors_unwrap_to_transport() {
        let err = message_error(
            "send failed",
            MessageError::Frame(FrameError::Transport(TransportError::Closed)),
        );
        assert_eq!(err.code, TRANSPORT_ERROR);

        let err = transport_error(
            "write failed",
            TransportError::Io(io::Error::from(io::ErrorKind::PermissionDenied)),
        );
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn stalled_writes_map_to_timeout_code() {
        let err = message_error(
            "send failed",
            MessageError::Frame(FrameError::Transport(TransportError::WriteTimeout {
                written: 4,
                waited: Duration::from_secs(1),
            })),
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.contains("write stalled after 4 bytes"));
    }

    #[test]
    fn oversized_requests_are_usage_errors() {
        let err = frame_error(
            "send failed",
            FrameError::EncodeLength {
                requested: 41,
                capacity: 40,
            },
        );
        assert_eq!(err.code, USAGE);
        assert_eq!(
            message_error("send failed", MessageError::BodyTooLong { len: 39, max: 38 }).code,
            USAGE
        );
    }
}
