//! Homomorphic add / mult.  λ-tensor is solved at construction.

use crate::channel::Channel;
use crate::cipher::Cipher;
use crate::polynomial::{mod_inverse, Polynomial};
use crate::scheme::SecretKey;
use rand::Rng;

/// Holds the multiplication tensor and the reduction modulus.
///
/// The tensor satisfies Σ_k λ_ijk·ξ_k ≡ ξ_i·ξ_j (mod q), which is what makes
/// the product ciphertext decrypt to the product of the decryptions.
pub struct Evaluator {
    tensor: Vec<Vec<Vec<u128>>>, // λ_ijk  (dim³)
    dim: usize,
    u: Polynomial,
}

impl Evaluator {
    /// Solve the tensor for the given secret: all but the last coordinate
    /// of each (i, j) row are uniform, the last one closes the identity
    /// through ξ_{dim−1}⁻¹ (total since q is prime and ξ is nonzero).
    pub fn new(chan: &Channel, key: &SecretKey) -> Self {
        let mut rng = rand::thread_rng();
        Self::with_rng(chan, key, &mut rng)
    }

    /// `new` with the caller's RNG.
    pub fn with_rng<R: Rng>(chan: &Channel, key: &SecretKey, rng: &mut R) -> Self {
        let q = chan.q;
        let dim = chan.dim;
        let xi = &key.xi;
        let inv_last = mod_inverse(xi[dim - 1], q)
            .expect("secret evaluation must be invertible");

        let mut tensor = vec![vec![vec![0u128; dim]; dim]; dim];
        for i in 0..dim {
            for j in 0..dim {
                let target = xi[i] * xi[j] % q;
                let mut partial = 0u128;
                for k in 0..dim - 1 {
                    let lam = rng.gen_range(0..q);
                    tensor[i][j][k] = lam;
                    partial = (partial + lam * xi[k]) % q;
                }
                tensor[i][j][dim - 1] = (q + target - partial) % q * inv_last % q;
            }
        }

        Self {
            tensor,
            dim,
            u: chan.u.clone(),
        }
    }

    /// Component-wise combine; `subtract` selects left minus right.
    /// Levels add either way.
    pub fn add(&self, a: &Cipher, b: &Cipher, subtract: bool) -> Cipher {
        let combine = |x: &Polynomial, y: &Polynomial| {
            if subtract {
                &(x - y) % &self.u
            } else {
                &(x + y) % &self.u
            }
        };
        let c0: Vec<Polynomial> = (0..self.dim)
            .map(|k| combine(&a.c0[k], &b.c0[k]))
            .collect();
        let c1 = combine(&a.c1, &b.c1);
        Cipher {
            c0,
            c1,
            level: a.level.saturating_add(b.level),
        }
    }

    /// Tensor multiply; levels multiply.
    pub fn mult(&self, a: &Cipher, b: &Cipher) -> Cipher {
        // P_ij = a0_i · b0_j mod u, shared across the k loop.
        let prods: Vec<Vec<Polynomial>> = (0..self.dim)
            .map(|i| {
                (0..self.dim)
                    .map(|j| &(&a.c0[i] * &b.c0[j]) % &self.u)
                    .collect()
            })
            .collect();

        // t_k = Σ_ij λ_ijk · P_ij
        let modu = self.u.modulus;
        let mut t = vec![Polynomial::zero(modu); self.dim];
        for k in 0..self.dim {
            for i in 0..self.dim {
                for j in 0..self.dim {
                    let lam = Polynomial::constant(self.tensor[i][j][k], modu);
                    t[k] = &(&t[k] + &(&lam * &prods[i][j])) % &self.u;
                }
            }
        }

        let c0: Vec<Polynomial> = (0..self.dim)
            .map(|k| {
                let term1 = &(&b.c1 * &a.c0[k]) % &self.u;
                let term2 = &(&a.c1 * &b.c0[k]) % &self.u;
                let sum = &(&term1 + &term2) % &self.u;
                &(&sum - &t[k]) % &self.u
            })
            .collect();
        let c1 = &(&a.c1 * &b.c1) % &self.u;

        Cipher {
            c0,
            c1,
            level: a.level.saturating_mul(b.level),
        }
    }
}
