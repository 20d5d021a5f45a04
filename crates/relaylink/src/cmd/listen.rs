use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use relaylink_frame::{Received, Session};
use relaylink_transport::ByteStream;
use tracing::{info, warn};

use crate::cmd::ListenArgs;
use crate::exit::{frame_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_frame, OutputFormat};

/// Pause between polls while the line is idle.
const IDLE_POLL: Duration = Duration::from_millis(1);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = args.link.open()?;
    info!(port = ?session.get_ref().path(), count = ?args.count, "listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let received = receive_frames(&mut session, &running, args.count, |frame| {
        print_frame(frame, format)
    })?;
    info!(received, "listener stopped");

    session.into_inner().close();
    Ok(SUCCESS)
}

fn receive_frames<S: ByteStream>(
    session: &mut Session<S>,
    running: &AtomicBool,
    count: Option<usize>,
    mut on_frame: impl FnMut(&Received),
) -> CliResult<usize> {
    let mut received = 0usize;

    while running.load(Ordering::SeqCst) {
        match session.decode() {
            Ok(Some(frame)) => {
                on_frame(&frame);
                received = received.saturating_add(1);
                if count.is_some_and(|count| received >= count) {
                    break;
                }
            }
            Ok(None) => thread::sleep(IDLE_POLL),
            Err(err) if err.is_frame_local() => {
                warn!(error = %err, kind = err.kind(), "dropped frame");
            }
            Err(err) => return Err(frame_error("receive failed", err)),
        }
    }

    Ok(received)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use relaylink_frame::SessionConfig;
    use relaylink_transport::{MemoryStream, TransportError};

    use super::*;
    use crate::exit::TRANSPORT_ERROR;

    const FRAME_A: [u8; 6] = [0x7E, 0x02, 0x00, 0x05, 0xFB, 0xEF];
    const FRAME_B: [u8; 6] = [0x7E, 0x02, 0x01, 0x07, 0xF8, 0xEF];

    fn additive_session(stream: MemoryStream) -> Session<MemoryStream> {
        Session::with_config(
            stream,
            SessionConfig {
                checksum: relaylink_frame::Checksum::Additive,
                ..SessionConfig::default()
            },
        )
    }

    #[test]
    fn stops_after_count_and_skips_bad_frames() {
        let mut bytes = FRAME_A.to_vec();
        bytes.extend_from_slice(&[0x7E, 0x03, 0xEF]);
        bytes.extend_from_slice(&FRAME_B);
        let mut session = additive_session(MemoryStream::with_incoming(&bytes));
        let running = AtomicBool::new(true);

        let mut seen = Vec::new();
        let received = receive_frames(&mut session, &running, Some(2), |frame| {
            seen.push(frame.pairs().collect::<Vec<_>>())
        })
        .unwrap();

        assert_eq!(received, 2);
        assert_eq!(seen, vec![vec![(0, 5)], vec![(1, 7)]]);
        assert_eq!(session.incoming().get(1).unwrap(), 7);
    }

    #[test]
    fn returns_when_stopped() {
        let mut session = additive_session(MemoryStream::with_incoming(&FRAME_A));
        let running = AtomicBool::new(false);

        let received = receive_frames(&mut session, &running, None, |_| {}).unwrap();
        assert_eq!(received, 0);
    }

    #[test]
    fn transport_failure_ends_listener() {
        struct Unplugged;

        impl ByteStream for Unplugged {
            fn available(&mut self) -> relaylink_transport::Result<usize> {
                Err(TransportError::Io(std::io::Error::from(
                    std::io::ErrorKind::BrokenPipe,
                )))
            }
            fn read_byte(&mut self) -> relaylink_transport::Result<u8> {
                Err(TransportError::Closed)
            }
            fn write_bytes(&mut self, _buf: &[u8]) -> relaylink_transport::Result<()> {
                Err(TransportError::Closed)
            }
        }

        let mut session = Session::new(Unplugged);
        let running = AtomicBool::new(true);
        let err = receive_frames(&mut session, &running, None, |_| {}).unwrap_err();
        assert_eq!(err.code, TRANSPORT_ERROR);
    }
}
