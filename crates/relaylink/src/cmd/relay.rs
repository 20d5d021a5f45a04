use relaylink::Message;
use tracing::info;

use crate::cmd::RelayArgs;
use crate::exit::{message_error, CliResult, SUCCESS};

pub fn run(args: RelayArgs, active: bool) -> CliResult<i32> {
    let mut session = args.link.open()?;

    Message::set_output(args.output, active)
        .send(&mut session)
        .map_err(|err| message_error("send failed", err))?;
    info!(output = args.output, active, "relay command sent");

    session.into_inner().close();
    Ok(SUCCESS)
}
