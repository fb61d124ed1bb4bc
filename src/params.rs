//! Channel parameter sets and their validation.

use crate::error::{Error, Result};
use crate::polynomial::NTT_THRESHOLD;
use num_integer::gcd;
use serde::{Deserialize, Serialize};

/// NTT-friendly prime 29·2^57 + 1 used by the shipped presets.
pub const Q_NTT: u128 = 29 * (1 << 57) + 1;

/// Parameters of an arithmetic channel.
///
/// `p` is the plaintext modulus (values live in the centered range
/// ±(p-1)/2), `q` the coefficient modulus, `deg` the degree of the modulus
/// polynomial u, `dim` the vector dimension of ciphertexts. `seed` pins the
/// engine RNG for reproducible runs; `None` draws from entropy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Plaintext modulus (odd prime).
    pub p: u128,
    /// Coefficient modulus (odd prime, 1 mod a large power of two).
    pub q: u128,
    /// Degree of the modulus polynomial u.
    pub deg: usize,
    /// Ciphertext vector dimension.
    pub dim: usize,
    /// Optional RNG seed.
    pub seed: Option<u64>,
}

impl Params {
    /// Default demo set: centered range ±384, roughly four chained
    /// multiplications of fresh ciphertexts inside budget.
    pub fn demo() -> Self {
        Self {
            p: 769,
            q: Q_NTT,
            deg: 4,
            dim: 5,
            seed: None,
        }
    }

    /// Wider plaintext range (±6144) at the cost of multiplication depth.
    pub fn wide() -> Self {
        Self {
            p: 12289,
            q: Q_NTT,
            deg: 4,
            dim: 5,
            seed: None,
        }
    }

    /// Smallest usable set. A single multiplication of fresh ciphertexts
    /// already exceeds the budget; the noise-budget tests rely on that.
    pub fn narrow() -> Self {
        Self {
            p: 5,
            q: 257,
            deg: 2,
            dim: 2,
            seed: None,
        }
    }

    /// Same parameters with the RNG pinned.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Level carried by a fresh ciphertext: the message magnitude plus one
    /// vanisher (evaluation p) per selected public row.
    pub fn fresh_level(&self) -> u128 {
        (self.p - 1) / 2 + self.p.saturating_mul(self.dim as u128)
    }

    /// Largest level at which the centered lift still recovers the value.
    pub fn level_bound(&self) -> u128 {
        (self.q - 1) / 2
    }

    /// Check the constraints `Engine::new` relies on.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| {
            Err(Error::InvalidEngine {
                reason: reason.to_string(),
            })
        };
        if self.p < 3 || self.p % 2 == 0 {
            return fail("p must be an odd prime of at least 3");
        }
        if self.p > 1 << 32 {
            return fail("p too large for the i64 plaintext API");
        }
        if self.q <= self.p || self.q % 2 == 0 {
            return fail("q must be an odd prime larger than p");
        }
        if gcd(self.p, self.q) != 1 {
            return fail("p and q must be coprime");
        }
        if self.deg < 2 {
            return fail("modulus polynomial degree must be at least 2");
        }
        if self.dim == 0 {
            return fail("ciphertext dimension must be positive");
        }
        if self.fresh_level() > self.level_bound() {
            return fail("fresh ciphertexts would already exceed the level budget");
        }
        // Reduced factors carry at most `deg` coefficients, so products past
        // the threshold transform over next_pow2(2·deg - 1) points.
        if self.deg > NTT_THRESHOLD {
            let ntt_len = (2 * self.deg - 1).next_power_of_two() as u128;
            if (self.q - 1) % ntt_len != 0 {
                return fail("q - 1 must carry the power-of-two NTT length this degree needs");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(Params::demo().validate().is_ok());
        assert!(Params::wide().validate().is_ok());
        assert!(Params::narrow().validate().is_ok());
    }

    #[test]
    fn test_invalid_sets_are_named() {
        let cases = [
            Params { p: 4, ..Params::demo() },
            Params { p: 769, q: 769, ..Params::demo() },
            Params { p: 3, q: 27, ..Params::demo() },
            Params { deg: 1, ..Params::demo() },
            Params { dim: 0, ..Params::demo() },
            // p·dim pushes the fresh level past (q-1)/2.
            Params { p: 101, q: 103, deg: 2, dim: 4, seed: None },
        ];
        for params in cases {
            match params.validate() {
                Err(Error::InvalidEngine { reason }) => assert!(!reason.is_empty()),
                other => panic!("expected InvalidEngine, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_validate_checks_ntt_support_for_large_degrees() {
        // 23 - 1 = 2·11 admits no order-128 root of unity
        let bad = Params { p: 3, q: 23, deg: 33, dim: 2, seed: None };
        match bad.validate() {
            Err(Error::InvalidEngine { reason }) => assert!(reason.contains("NTT")),
            other => panic!("expected InvalidEngine, got {other:?}"),
        }

        // 29·2^57 + 1 has two-adicity to spare at the same degree scale
        let good = Params { deg: 64, dim: 2, ..Params::demo() };
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_fresh_level_demo() {
        let params = Params::demo();
        assert_eq!(params.fresh_level(), 384 + 769 * 5);
        assert!(params.fresh_level() < params.level_bound());
    }

    #[test]
    fn test_narrow_breaks_on_one_mult() {
        let params = Params::narrow();
        let fresh = params.fresh_level();
        assert!(fresh <= params.level_bound());
        assert!(fresh * fresh > params.level_bound());
    }

    #[test]
    fn test_with_seed() {
        let params = Params::demo().with_seed(7);
        assert_eq!(params.seed, Some(7));
        assert_eq!(Params { seed: None, ..params }, Params::demo());
    }
}
