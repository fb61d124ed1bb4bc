//! Error taxonomy shared by the engine and the handle layer.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything an engine or handle operation can refuse.
///
/// Construction-time variants (`InvalidEngine`, `InvalidLength`) are raised
/// before any state exists; operation-time variants are raised before any
/// engine-side allocation or mutation, so a failed operation leaves every
/// participating handle untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Parameter set rejected at engine construction.
    #[error("invalid engine parameters: {reason}")]
    InvalidEngine {
        /// The violated constraint.
        reason: String,
    },

    /// Handle or plaintext width must be at least one slot.
    #[error("invalid length {given}: width must be positive")]
    InvalidLength {
        /// The rejected width.
        given: usize,
    },

    /// Operand handle belongs to a different engine instance.
    #[error("operand handle belongs to a different engine")]
    EngineMismatch,

    /// Operand widths are incompatible.
    #[error("length mismatch: {lhs} vs {rhs}")]
    LengthMismatch {
        /// Width of the left operand (or of the destination's slot list).
        lhs: usize,
        /// Width of the right operand (or of the source's slot list).
        rhs: usize,
    },

    /// Plaintext value outside the centered range of the channel.
    #[error("plaintext value {value} outside the representable range ±{bound}")]
    PlainOutOfRange {
        /// The rejected value.
        value: i64,
        /// Largest representable magnitude, (p-1)/2.
        bound: i64,
    },

    /// Result level would exceed the channel budget; refused before commit.
    #[error("noise level {level} exceeds the channel budget {bound}")]
    NoiseBudget {
        /// Level the refused result would have carried.
        level: u128,
        /// Channel budget, (q-1)/2.
        bound: u128,
    },

    /// Slot id not present in the engine store (stale or foreign handle).
    #[error("unknown slot id {id:?}")]
    UnknownSlot {
        /// The missing id.
        id: String,
    },
}
