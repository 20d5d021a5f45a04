use tracing::warn;

use crate::error::RegisterError;

/// Number of addressable registers on each side of the link.
pub const REGISTER_COUNT: usize = 40;

/// Fixed-capacity array of 8-bit registers addressed by index.
///
/// Application access is bounds-checked and reports
/// [`RegisterError::IndexOutOfRange`]. Ids arriving over the wire are
/// filtered by [`apply_pairs`](RegisterStore::apply_pairs) instead, which
/// drops out-of-range pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterStore {
    values: [u8; REGISTER_COUNT],
}

/// What [`RegisterStore::apply_pairs`] did with a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Pairs written into the store.
    pub applied: usize,
    /// Pairs skipped because their id was out of range.
    pub dropped: usize,
}

impl Default for RegisterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterStore {
    /// A store with every register zeroed.
    pub const fn new() -> Self {
        Self {
            values: [0; REGISTER_COUNT],
        }
    }

    /// Number of registers.
    pub const fn capacity(&self) -> usize {
        REGISTER_COUNT
    }

    /// Read one register.
    pub fn get(&self, index: usize) -> Result<u8, RegisterError> {
        self.values
            .get(index)
            .copied()
            .ok_or(RegisterError::IndexOutOfRange {
                index,
                capacity: REGISTER_COUNT,
            })
    }

    /// Write one register.
    pub fn set(&mut self, index: usize, value: u8) -> Result<(), RegisterError> {
        let slot = self
            .values
            .get_mut(index)
            .ok_or(RegisterError::IndexOutOfRange {
                index,
                capacity: REGISTER_COUNT,
            })?;
        *slot = value;
        Ok(())
    }

    /// Copy `values` into consecutive registers starting at `offset`.
    ///
    /// Nothing is written unless the whole range fits.
    pub fn write_at(&mut self, offset: usize, values: &[u8]) -> Result<(), RegisterError> {
        let end = offset.saturating_add(values.len());
        if end > REGISTER_COUNT {
            return Err(RegisterError::IndexOutOfRange {
                index: end - 1,
                capacity: REGISTER_COUNT,
            });
        }
        self.values[offset..end].copy_from_slice(values);
        Ok(())
    }

    /// The first `count` registers.
    pub fn prefix(&self, count: usize) -> Result<&[u8], RegisterError> {
        if count > REGISTER_COUNT {
            return Err(RegisterError::IndexOutOfRange {
                index: count - 1,
                capacity: REGISTER_COUNT,
            });
        }
        Ok(&self.values[..count])
    }

    /// All registers.
    pub fn as_slice(&self) -> &[u8] {
        &self.values
    }

    /// Zero every register.
    pub fn clear(&mut self) {
        self.values = [0; REGISTER_COUNT];
    }

    /// Apply a validated payload of `(id, value)` pairs.
    ///
    /// Pairs whose id is not below [`REGISTER_COUNT`] are skipped. A trailing
    /// odd byte is ignored; the codec never passes one.
    pub fn apply_pairs(&mut self, payload: &[u8]) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();
        for pair in payload.chunks_exact(2) {
            let (id, value) = (pair[0] as usize, pair[1]);
            match self.values.get_mut(id) {
                Some(slot) => {
                    *slot = value;
                    outcome.applied += 1;
                }
                None => {
                    warn!(id, value, "dropping register pair with out-of-range id");
                    outcome.dropped += 1;
                }
            }
        }
        outcome
    }
}
