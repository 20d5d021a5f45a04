use relaylink::{Message, MessageType};
use relaylink_frame::Session;
use relaylink_transport::ByteStream;
use tracing::warn;

use crate::cmd::{parse_duration, StatsArgs};
use crate::exit::{frame_error, message_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: StatsArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let mut session = args.link.open()?;

    let response = request_stats(&mut session, wait_timeout)?;
    print_message(&response, format);

    session.into_inner().close();
    Ok(SUCCESS)
}

fn request_stats<S: ByteStream>(
    session: &mut Session<S>,
    wait_timeout: std::time::Duration,
) -> CliResult<Message> {
    Message::get_stats()
        .send(session)
        .map_err(|err| message_error("send failed", err))?;

    let frame = session
        .wait_for_frame(wait_timeout)
        .map_err(|err| frame_error("no response", err))?;
    if frame.dropped > 0 {
        warn!(dropped = frame.dropped, "response carried out-of-range ids");
    }

    let response = Message::read_from(session.incoming())
        .map_err(|err| message_error("invalid response", err))?;
    if response.kind() != MessageType::GetStats {
        warn!(kind = response.kind().name(), "unexpected response type");
    }
    Ok(response)
}
