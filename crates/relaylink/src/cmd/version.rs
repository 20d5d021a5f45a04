use relaylink_frame::{Checksum, MAX_PAYLOAD, REGISTER_COUNT};
use relaylink_transport::DEFAULT_BAUD_RATE;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("relaylink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: relaylink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("RELAYLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("registers: {REGISTER_COUNT}");
    println!("max_payload: {MAX_PAYLOAD}");
    println!("default_checksum: {}", Checksum::default());
    println!("default_baud: {DEFAULT_BAUD_RATE}");
    println!("features: cli={}", cfg!(feature = "cli"));

    Ok(SUCCESS)
}
