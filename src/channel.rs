//! Arithmetic channel: the ring Z_q[x]/(u) with evaluation at ω = 1.

use crate::params::Params;
use crate::polynomial::Polynomial;
use rand::Rng;

/// Channel state (p, q, ω, u).
///
/// The modulus polynomial u is monic with u(ω) = 0, so reduction mod u
/// preserves evaluation at ω and the evaluation map R → Z_q is a ring
/// homomorphism. All homomorphic identities in this crate go through it.
#[derive(Clone, Debug)]
pub struct Channel {
    /// Plaintext modulus p (odd prime).
    pub p: u128,
    /// Coefficient modulus q.
    pub q: u128,
    /// Degree of u; reduced polynomials carry up to `deg` coefficients.
    pub deg: usize,
    /// Ciphertext vector dimension.
    pub dim: usize,
    /// Modulus polynomial, monic of degree `deg`, u(1) = 0.
    pub u: Polynomial,
    /// Evaluation point, pinned to 1: evaluation is coefficient summation.
    pub omega: u128,
}

impl Channel {
    /// Build a channel from validated parameters.
    pub fn new<R: Rng>(params: &Params, rng: &mut R) -> Self {
        let u = Self::generate_u(params.deg, params.q, rng);
        Self {
            p: params.p,
            q: params.q,
            deg: params.deg,
            dim: params.dim,
            u,
            omega: 1,
        }
    }

    /// Monic u of degree `deg` with u(1) = 0: middle coefficients are
    /// uniform, the constant term balances the sum.
    fn generate_u<R: Rng>(deg: usize, q: u128, rng: &mut R) -> Polynomial {
        let mut coeffs = vec![0u128; deg + 1];
        coeffs[deg] = 1;
        for c in coeffs.iter_mut().take(deg).skip(1) {
            *c = rng.gen_range(0..q);
        }
        let sum = coeffs.iter().fold(0u128, |acc, &x| (acc + x) % q);
        coeffs[0] = (q - sum) % q;
        Polynomial { coeffs, modulus: q }
    }

    /// Evaluate at ω.
    pub fn eval(&self, poly: &Polynomial) -> u128 {
        assert_eq!(poly.modulus, self.q, "polynomial modulus mismatch");
        poly.eval_at_one()
    }

    /// Carrier polynomial: uniform with evaluation exactly `m` (a residue).
    pub fn carrier<R: Rng>(&self, m: u128, rng: &mut R) -> Polynomial {
        Polynomial::random_with_eval(m, self.q, self.deg, rng)
    }

    /// Vanisher: uniform with evaluation exactly p, so it disappears mod p
    /// while adding at most p to the centered magnitude.
    pub fn vanisher<R: Rng>(&self, rng: &mut R) -> Polynomial {
        Polynomial::random_with_eval(self.p, self.q, self.deg, rng)
    }

    /// Largest representable plaintext magnitude, (p-1)/2.
    pub fn plain_bound(&self) -> i64 {
        ((self.p - 1) / 2) as i64
    }

    /// Largest level at which the centered lift is still exact, (q-1)/2.
    pub fn level_bound(&self) -> u128 {
        (self.q - 1) / 2
    }

    /// Level assigned to fresh ciphertexts.
    pub fn fresh_level(&self) -> u128 {
        (self.p - 1) / 2 + self.p * self.dim as u128
    }

    /// Lift a centered value into Z_q.
    pub fn lift(&self, value: i64) -> u128 {
        let a = u128::from(value.unsigned_abs()) % self.q;
        if value >= 0 {
            a
        } else {
            (self.q - a) % self.q
        }
    }

    /// Centered representative of a residue, in ±(q-1)/2.
    pub fn center(&self, residue: u128) -> i128 {
        if residue <= (self.q - 1) / 2 {
            residue as i128
        } else {
            residue as i128 - self.q as i128
        }
    }

    /// Centered value mod p of a residue: the decrypted plaintext.
    pub fn to_plain(&self, residue: u128) -> i64 {
        let p = self.p as i128;
        let half = (p - 1) / 2;
        let mut r = self.center(residue) % p;
        if r > half {
            r -= p;
        }
        if r < -half {
            r += p;
        }
        r as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    fn demo_channel() -> Channel {
        Channel::new(&Params::demo(), &mut thread_rng())
    }

    #[test]
    fn test_u_is_monic_with_root_at_one() {
        let chan = demo_channel();
        assert_eq!(chan.u.coeffs.len(), chan.deg + 1);
        assert_eq!(chan.u.coeffs[chan.deg], 1);
        assert_eq!(chan.eval(&chan.u), 0);
    }

    #[test]
    fn test_carrier_and_vanisher_evals() {
        let chan = demo_channel();
        let mut rng = thread_rng();
        for m in [0u128, 1, 384, chan.q - 5] {
            assert_eq!(chan.eval(&chan.carrier(m, &mut rng)), m % chan.q);
        }
        for _ in 0..4 {
            assert_eq!(chan.eval(&chan.vanisher(&mut rng)), chan.p);
        }
    }

    #[test]
    fn test_lift_center_round_trip() {
        let chan = demo_channel();
        for v in [0i64, 1, -1, 384, -384, 17, -291] {
            let residue = chan.lift(v);
            assert!(residue < chan.q);
            assert_eq!(chan.center(residue), i128::from(v));
        }
    }

    #[test]
    fn test_to_plain_strips_vanisher_multiples() {
        let chan = demo_channel();
        let p = chan.p as i64;
        for v in [0i64, 5, -5, 384, -384] {
            for k in [-3i64, -1, 0, 1, 4] {
                let shifted = v + k * p;
                assert_eq!(chan.to_plain(chan.lift(shifted)), v);
            }
        }
    }

    #[test]
    fn test_reduction_mod_u_preserves_eval() {
        let chan = demo_channel();
        let mut rng = thread_rng();
        let a = Polynomial::random(chan.q, chan.deg, &mut rng);
        let b = Polynomial::random(chan.q, chan.deg, &mut rng);
        let prod = &a * &b;
        let reduced = &prod % &chan.u;
        assert!(reduced.degree() < chan.deg);
        assert_eq!(chan.eval(&reduced), chan.eval(&prod));
    }
}
