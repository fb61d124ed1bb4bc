//! Key generation, encryption, decryption.

use crate::channel::Channel;
use crate::cipher::Cipher;
use crate::error::{Error, Result};
use crate::polynomial::Polynomial;
use nalgebra::DMatrix;
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};

/// Secret key: `dim` polynomials, evaluations cached and forced nonzero so
/// the multiplication tensor is always solvable.
pub struct SecretKey {
    /// Secret vector x.
    pub x: Vec<Polynomial>,
    /// ξ_k = x_k(ω), all nonzero.
    pub xi: Vec<u128>,
}

/// Public state: f₀ and f₁ = f₀·x + e with vanisher noise rows.
pub struct Scheme {
    /// Public matrix, dim × dim reduced polynomials.
    pub f0: DMatrix<Polynomial>,
    /// f₁ rows; f₁_i − ⟨f₀_i, x⟩ evaluates to p.
    pub f1: Vec<Polynomial>,
    chan: Channel,
}

impl Scheme {
    /// Generate a keypair over the channel.
    pub fn keygen<R: Rng>(chan: &Channel, rng: &mut R) -> (Self, SecretKey) {
        let dim = chan.dim;

        let mut x = Vec::with_capacity(dim);
        let mut xi = Vec::with_capacity(dim);
        for _ in 0..dim {
            let mut p = Polynomial::random(chan.q, chan.deg, rng);
            if p.eval_at_one() == 0 {
                p.coeffs[0] = (p.coeffs[0] + 1) % chan.q;
            }
            xi.push(p.eval_at_one());
            x.push(p);
        }

        let f0 = DMatrix::from_fn(dim, dim, |_, _| Polynomial::random(chan.q, chan.deg, rng));

        let mut f1 = Vec::with_capacity(dim);
        for i in 0..dim {
            let mut acc = Polynomial::zero(chan.q);
            for j in 0..dim {
                acc = &acc + &(&(&f0[(i, j)] * &x[j]) % &chan.u);
            }
            f1.push(&(&acc + &chan.vanisher(rng)) % &chan.u);
        }

        (
            Self {
                f0,
                f1,
                chan: chan.clone(),
            },
            SecretKey { x, xi },
        )
    }

    /// Encrypt one centered value.
    ///
    /// A Bernoulli subset of the public rows is summed and a carrier with
    /// evaluation `lift(value)` is added, so the decryption evaluation is
    /// `value` plus at most `dim` vanishers: the fresh level of the channel.
    pub fn encrypt<R: Rng>(&self, value: i64, rng: &mut R) -> Result<Cipher> {
        let bound = self.chan.plain_bound();
        if value.unsigned_abs() > bound.unsigned_abs() {
            return Err(Error::PlainOutOfRange { value, bound });
        }

        let coin = Bernoulli::new(0.5).expect("valid probability");
        let rows: Vec<bool> = (0..self.chan.dim).map(|_| coin.sample(rng)).collect();

        let mut c0 = vec![Polynomial::zero(self.chan.q); self.chan.dim];
        let mut c1 = self.chan.carrier(self.chan.lift(value), rng);
        for (i, _) in rows.iter().enumerate().filter(|(_, &b)| b) {
            for (k, c) in c0.iter_mut().enumerate() {
                *c = &*c + &self.f0[(i, k)];
            }
            c1 = &c1 + &self.f1[i];
        }

        Ok(Cipher {
            c0,
            c1,
            level: self.chan.fresh_level(),
        })
    }

    /// Decrypt with the secret key; exactness is the caller's concern via
    /// the level budget.
    #[must_use]
    pub fn decrypt(&self, c: &Cipher, key: &SecretKey) -> i64 {
        assert_eq!(key.x.len(), self.chan.dim, "secret key dimension mismatch");

        let mut inner = Polynomial::zero(self.chan.q);
        for (ci, xi) in c.c0.iter().zip(&key.x) {
            inner = &(&inner + &(&(ci * xi) % &self.chan.u)) % &self.chan.u;
        }
        let m_pre = &(&c.c1 - &inner) % &self.chan.u;
        self.chan.to_plain(self.chan.eval(&m_pre))
    }

    /// Channel this scheme was keyed for.
    pub fn channel(&self) -> &Channel {
        &self.chan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Evaluator;
    use crate::params::Params;
    use rand::thread_rng;

    fn setup() -> (Channel, Scheme, SecretKey) {
        let mut rng = thread_rng();
        let chan = Channel::new(&Params::demo(), &mut rng);
        let (scheme, key) = Scheme::keygen(&chan, &mut rng);
        (chan, scheme, key)
    }

    #[test]
    fn test_keygen_noise_rows_vanish() {
        let (chan, scheme, key) = setup();
        for i in 0..chan.dim {
            let mut acc = Polynomial::zero(chan.q);
            for j in 0..chan.dim {
                acc = &(&acc + &(&(&scheme.f0[(i, j)] * &key.x[j]) % &chan.u)) % &chan.u;
            }
            let noise = &(&scheme.f1[i] - &acc) % &chan.u;
            assert_eq!(chan.eval(&noise), chan.p, "row {i} noise must evaluate to p");
        }
        assert!(key.xi.iter().all(|&v| v != 0));
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let (chan, scheme, key) = setup();
        let mut rng = thread_rng();
        for value in [0i64, 1, -1, 17, -17, 140, chan.plain_bound(), -chan.plain_bound()] {
            let c = scheme.encrypt(value, &mut rng).unwrap();
            assert_eq!(c.level, chan.fresh_level());
            assert_eq!(scheme.decrypt(&c, &key), value, "round trip for {value}");
        }
    }

    #[test]
    fn test_encrypt_rejects_out_of_range() {
        let (_, scheme, _) = setup();
        let mut rng = thread_rng();
        let over = scheme.channel().plain_bound() + 1;
        for value in [over, -over, i64::MAX] {
            match scheme.encrypt(value, &mut rng) {
                Err(Error::PlainOutOfRange { value: v, bound }) => {
                    assert_eq!(v, value);
                    assert_eq!(bound, scheme.channel().plain_bound());
                }
                other => panic!("expected PlainOutOfRange, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_homomorphic_ops_through_evaluator() {
        let (chan, scheme, key) = setup();
        let mut rng = thread_rng();
        let eval = Evaluator::new(&chan, &key);

        let (ma, mb) = (23i64, -7i64);
        let a = scheme.encrypt(ma, &mut rng).unwrap();
        let b = scheme.encrypt(mb, &mut rng).unwrap();

        let sum = eval.add(&a, &b, false);
        assert_eq!(scheme.decrypt(&sum, &key), ma + mb);
        assert_eq!(sum.level, a.level + b.level);

        let diff = eval.add(&a, &b, true);
        assert_eq!(scheme.decrypt(&diff, &key), ma - mb);

        let prod = eval.mult(&a, &b);
        assert_eq!(scheme.decrypt(&prod, &key), ma * mb);
        assert_eq!(prod.level, a.level * b.level);
    }

    #[test]
    fn test_multiplication_chain_stays_exact() {
        let (chan, scheme, key) = setup();
        let mut rng = thread_rng();
        let eval = Evaluator::new(&chan, &key);

        // 2·3·(−1)·4 = −24, four fresh factors and three multiplies.
        let factors = [2i64, 3, -1, 4];
        let mut acc = scheme.encrypt(factors[0], &mut rng).unwrap();
        let mut expected = factors[0];
        for &f in &factors[1..] {
            let c = scheme.encrypt(f, &mut rng).unwrap();
            acc = eval.mult(&acc, &c);
            expected *= f;
        }
        assert!(acc.level <= chan.level_bound(), "chain must stay in budget");
        assert_eq!(scheme.decrypt(&acc, &key), expected);
    }
}
