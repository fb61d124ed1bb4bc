//! Ciphertext container.

use crate::polynomial::Polynomial;

/// (c₀, c₁, level)
///
/// Decryption evaluates c₁ − ⟨c₀, x⟩ at ω; `level` bounds the magnitude of
/// that centered evaluation, so the lift stays exact while the level stays
/// under the channel budget.
#[derive(Clone, Debug)]
pub struct Cipher {
    /// Vector part, `dim` reduced polynomials.
    pub c0: Vec<Polynomial>,
    /// Scalar part.
    pub c1: Polynomial,
    /// Bound on |centered evaluation|.
    pub level: u128,
}
