//! Plaintext container staged for encryption.

use crate::error::{Error, Result};

/// Centered plaintext values, one per slot.
///
/// Width is fixed and positive; the value range is checked at encrypt time
/// against the engine's channel, not here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ptxt {
    values: Vec<i64>,
}

impl Ptxt {
    /// Wrap a non-empty value vector.
    pub fn new(values: Vec<i64>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::InvalidLength { given: 0 });
        }
        Ok(Self { values })
    }

    /// `len` copies of one value: the scalar-promotion staging buffer.
    pub fn broadcast(value: i64, len: usize) -> Result<Self> {
        if len == 0 {
            return Err(Error::InvalidLength { given: 0 });
        }
        Ok(Self {
            values: vec![value; len],
        })
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; kept for the usual container pairing with `len`.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Slot values.
    pub fn values(&self) -> &[i64] {
        &self.values
    }
}
