use bytes::{BufMut, BytesMut};

use crate::checksum::Checksum;
use crate::error::{FrameError, Result};
use crate::registers::{RegisterStore, REGISTER_COUNT};

/// Start-of-frame sentinel.
pub const START_BYTE: u8 = 0x7E;

/// End-of-frame sentinel.
pub const END_BYTE: u8 = 0xEF;

/// Largest payload: one `(id, value)` pair per register.
pub const MAX_PAYLOAD: usize = REGISTER_COUNT * 2;

/// Bytes around the payload: start, length, checksum, end.
pub const FRAME_OVERHEAD: usize = 4;

/// Bytes still expected after the length byte for a payload of `length`.
pub const fn trailer_len(length: usize) -> usize {
    length + 2
}

/// Total wire size of a frame carrying `count` registers.
pub const fn wire_size(count: usize) -> usize {
    FRAME_OVERHEAD + count * 2
}

/// Check a received length byte.
pub fn validate_length(length: u8) -> Result<usize> {
    let len = length as usize;
    if len > MAX_PAYLOAD || len % 2 != 0 {
        return Err(FrameError::PayloadLength {
            length,
            max: MAX_PAYLOAD,
        });
    }
    Ok(len)
}

/// Encode the first `count` registers of `store` as a frame.
///
/// Ids are positions: register `i` goes out as the pair `(i, store[i])`.
/// Returns the checksum byte that was written. Nothing is appended to `dst`
/// when `count` exceeds the store.
///
/// Wire format:
/// ```text
/// ┌───────┬───────┬──────────────────────────┬──────────┬───────┐
/// │ Start │ Len   │ Payload (Len bytes)      │ Checksum │ End   │
/// │ 0x7E  │ 2×cnt │ id0 val0 id1 val1 ...    │ (1B)     │ 0xEF  │
/// └───────┴───────┴──────────────────────────┴──────────┴───────┘
/// ```
pub fn encode_frame(
    store: &RegisterStore,
    count: usize,
    checksum: Checksum,
    dst: &mut BytesMut,
) -> Result<u8> {
    if count > REGISTER_COUNT {
        return Err(FrameError::EncodeLength {
            requested: count,
            capacity: REGISTER_COUNT,
        });
    }
    let values = store.prefix(count)?;

    let mut payload = [0u8; MAX_PAYLOAD];
    for (id, &value) in values.iter().enumerate() {
        payload[id * 2] = id as u8;
        payload[id * 2 + 1] = value;
    }
    let payload = &payload[..count * 2];
    let sum = checksum.compute(payload);

    dst.reserve(wire_size(count));
    dst.put_u8(START_BYTE);
    dst.put_u8(payload.len() as u8);
    dst.put_slice(payload);
    dst.put_u8(sum);
    dst.put_u8(END_BYTE);
    Ok(sum)
}
