//! Frame integrity checks.
//!
//! Both variants cover the payload bytes only; sentinels and the length byte
//! are not included.

use std::fmt;
use std::str::FromStr;

/// Reflected form of the CRC-8 polynomial x^8 + x^5 + x^4 + 1.
pub const CRC8_POLY_REFLECTED: u8 = 0x8C;

/// Checksum algorithm used by both ends of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Checksum {
    /// Two's complement of the byte sum modulo 256.
    ///
    /// Weak: reordered bytes, and changes whose deltas cancel mod 256, go
    /// undetected. Older peripheral firmware uses it.
    Additive,
    /// CRC-8 with polynomial 0x8C, LSB first, zero init, no final XOR.
    #[default]
    Crc8,
}

impl Checksum {
    /// Compute the checksum byte over `bytes`.
    pub fn compute(self, bytes: &[u8]) -> u8 {
        match self {
            Checksum::Additive => additive(bytes),
            Checksum::Crc8 => crc8(bytes),
        }
    }

    /// True when `received` matches the checksum of `bytes`.
    pub fn verify(self, bytes: &[u8], received: u8) -> bool {
        self.compute(bytes) == received
    }

    pub fn name(self) -> &'static str {
        match self {
            Checksum::Additive => "additive",
            Checksum::Crc8 => "crc8",
        }
    }
}

fn additive(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |sum, &b| sum.wrapping_add(b))
        .wrapping_neg()
}

fn crc8(bytes: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in bytes {
        let mut inbyte = byte;
        for _ in 0..8 {
            let mix = (crc ^ inbyte) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= CRC8_POLY_REFLECTED;
            }
            inbyte >>= 1;
        }
    }
    crc
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown checksum name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown checksum {0:?} (expected \"crc8\" or \"additive\")")]
pub struct UnknownChecksum(pub String);

impl FromStr for Checksum {
    type Err = UnknownChecksum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crc8" | "crc-8" => Ok(Checksum::Crc8),
            "additive" | "sum" => Ok(Checksum::Additive),
            other => Err(UnknownChecksum(other.to_string())),
        }
    }
}
