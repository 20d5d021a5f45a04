use std::time::Duration;

use relaylink_frame::{Checksum, Received, Session, SessionConfig};
use relaylink_transport::MemoryStream;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_frame, OutputFormat};

/// A capture is complete up front; a short wait is enough to call it truncated.
const CAPTURE_TIMEOUT: Duration = Duration::from_millis(10);

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.hex)?;
    for frame in decode_capture(&bytes, args.checksum)? {
        print_frame(&frame, format);
    }
    Ok(SUCCESS)
}

/// Decode every frame in a captured byte sequence.
fn decode_capture(bytes: &[u8], checksum: Checksum) -> CliResult<Vec<Received>> {
    let config = SessionConfig {
        timeout: CAPTURE_TIMEOUT,
        checksum,
    };
    let mut session = Session::with_config(MemoryStream::with_incoming(bytes), config);

    let mut frames = Vec::new();
    while let Some(frame) = session
        .decode()
        .map_err(|err| frame_error("decode failed", err))?
    {
        frames.push(frame);
    }

    if frames.is_empty() {
        return Err(CliError::new(DATA_INVALID, "no frame in capture"));
    }
    Ok(frames)
}

/// Accepts `7E 06 00`, `7e:06:00`, `0x7E,0x06` or `7E0600`.
fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in input
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .filter(|t| !t.is_empty())
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        if digits.is_empty() || digits.len() % 2 != 0 || !digits.is_ascii() {
            return Err(CliError::new(USAGE, format!("invalid hex byte: {token}")));
        }
        for pair in digits.as_bytes().chunks(2) {
            let pair = std::str::from_utf8(pair).unwrap_or_default();
            let byte = u8::from_str_radix(pair, 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex byte: {token}")))?;
            bytes.push(byte);
        }
    }

    if bytes.is_empty() {
        return Err(CliError::new(USAGE, "no bytes to decode"));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::TIMEOUT;

    #[test]
    fn parses_common_hex_layouts() {
        let expected = vec![0x7E, 0x06, 0x00];
        assert_eq!(parse_hex("7E 06 00").unwrap(), expected);
        assert_eq!(parse_hex("7e:06:00").unwrap(), expected);
        assert_eq!(parse_hex("0x7E,0x06, 0x00").unwrap(), expected);
        assert_eq!(parse_hex("7E0600").unwrap(), expected);
    }

    #[test]
    fn rejects_bad_hex() {
        assert_eq!(parse_hex("7G").unwrap_err().code, USAGE);
        assert_eq!(parse_hex("7E0").unwrap_err().code, USAGE);
        assert_eq!(parse_hex("  ").unwrap_err().code, USAGE);
    }

    #[test]
    fn decodes_scenario_capture() {
        let bytes = parse_hex("7E 06 00 0A 01 14 02 1E F5 EF").unwrap();
        let frames = decode_capture(&bytes, Checksum::Crc8).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].pairs().collect::<Vec<_>>(),
            vec![(0, 10), (1, 20), (2, 30)]
        );
    }

    #[test]
    fn decodes_back_to_back_frames() {
        let bytes = parse_hex("7E 00 00 EF 7E 02 05 63 78 EF").unwrap();
        let frames = decode_capture(&bytes, Checksum::Crc8).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].pairs().collect::<Vec<_>>(), vec![(5, 0x63)]);
    }

    #[test]
    fn wrong_algorithm_is_data_invalid() {
        let bytes = parse_hex("7E 06 00 0A 01 14 02 1E F5 EF").unwrap();
        let err = decode_capture(&bytes, Checksum::Additive).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn truncated_capture_times_out() {
        let bytes = parse_hex("7E 06 00 0A").unwrap();
        let err = decode_capture(&bytes, Checksum::Crc8).unwrap_err();
        assert_eq!(err.code, TIMEOUT);
    }
}
