use relaylink_frame::Session;
use relaylink_transport::ByteStream;
use tracing::info;

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = if args.wait {
        Some(parse_duration(&args.wait_timeout)?)
    } else {
        None
    };
    let mut session = args.link.open()?;

    send_values(&mut session, &args.values)?;

    if let Some(budget) = wait_timeout {
        let frame = session
            .wait_for_frame(budget)
            .map_err(|err| frame_error("receive failed", err))?;
        print_frame(&frame, format);
    }

    session.into_inner().close();
    Ok(SUCCESS)
}

fn send_values<S: ByteStream>(session: &mut Session<S>, values: &[u8]) -> CliResult<()> {
    session
        .send_values(values)
        .map_err(|err| frame_error("send failed", err))?;
    info!(
        count = values.len(),
        checksum = session.last_checksum(),
        "sent registers"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use relaylink_frame::REGISTER_COUNT;
    use relaylink_transport::MemoryStream;

    use super::*;
    use crate::exit::USAGE;

    #[test]
    fn sends_values_as_dense_pairs() {
        let stream = MemoryStream::default();
        let mut session = Session::new(stream.clone());

        send_values(&mut session, &[10, 20, 30]).unwrap();

        assert_eq!(
            stream.take_outgoing(),
            vec![0x7E, 0x06, 0x00, 0x0A, 0x01, 0x14, 0x02, 0x1E, 0xF5, 0xEF]
        );
    }

    #[test]
    fn too_many_values_is_usage_error() {
        let stream = MemoryStream::default();
        let mut session = Session::new(stream.clone());

        let err = send_values(&mut session, &[1; REGISTER_COUNT + 1]).unwrap_err();
        assert_eq!(err.code, USAGE);
        assert_eq!(stream.pending_outgoing(), 0);
    }
}
