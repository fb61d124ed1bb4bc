//! Polynomial type over Z/qZ with u128 coefficients.

use crate::ntt;
use rand::Rng;
use std::cmp::max;
use std::ops::{Add, Mul, Neg, Rem, Sub};

/// Factor length beyond which `Mul` switches from schoolbook to NTT.
pub(crate) const NTT_THRESHOLD: usize = 32;

/// f(x) = coeffs[0] + coeffs[1]·x + ...  (always mod `modulus`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Polynomial {
    /// Coefficients, constant term first. Never empty.
    pub coeffs: Vec<u128>,
    /// Coefficient modulus q.
    pub modulus: u128,
}

impl Polynomial {
    /// Build from raw coefficients, reducing each mod `modulus`.
    pub fn new(coeffs: Vec<u128>, modulus: u128) -> Self {
        assert!(modulus > 1, "modulus must be at least 2");
        let coeffs = coeffs.into_iter().map(|x| x % modulus).collect::<Vec<_>>();
        let mut result = Self { coeffs, modulus };
        if result.coeffs.is_empty() {
            result.coeffs.push(0);
        }
        result.trim();
        result
    }

    /// Zero polynomial.
    pub fn zero(modulus: u128) -> Self {
        Self {
            coeffs: vec![0],
            modulus,
        }
    }

    /// Constant polynomial.
    pub fn constant(value: u128, modulus: u128) -> Self {
        Self {
            coeffs: vec![value % modulus],
            modulus,
        }
    }

    /// Uniform polynomial with `len` coefficients (degree below `len`).
    pub fn random<R: Rng>(modulus: u128, len: usize, rng: &mut R) -> Self {
        assert!(len > 0, "coefficient count must be positive");
        let coeffs = (0..len).map(|_| rng.gen_range(0..modulus)).collect();
        let mut result = Self { coeffs, modulus };
        result.trim();
        result
    }

    /// Uniform polynomial whose evaluation at 1 equals `target`.
    ///
    /// Samples `len` coefficients and shifts the constant term by the
    /// difference, so the distribution of the non-constant part stays
    /// uniform.
    pub fn random_with_eval<R: Rng>(
        target: u128,
        modulus: u128,
        len: usize,
        rng: &mut R,
    ) -> Self {
        let mut p = Self::random(modulus, len, rng);
        let shift = (modulus + target % modulus - p.eval_at_one()) % modulus;
        p.coeffs[0] = (p.coeffs[0] + shift) % modulus;
        p.trim();
        p
    }

    /// Drop trailing zero coefficients, keeping at least one.
    pub fn trim(&mut self) {
        while self.coeffs.len() > 1 && *self.coeffs.last().unwrap() == 0 {
            self.coeffs.pop();
        }
    }

    /// Evaluation at x = 1, the channel's evaluation point.
    pub fn eval_at_one(&self) -> u128 {
        self.coeffs
            .iter()
            .fold(0, |acc, &c| (acc + c) % self.modulus)
    }

    /// Remainder of division by `u` (long division, leading coefficient
    /// inverted mod q).
    pub fn rem_poly(&self, u: &Polynomial) -> Self {
        assert_eq!(self.modulus, u.modulus, "modulus mismatch in rem_poly");
        let deg_u = u.degree();
        assert!(
            deg_u > 0 || u.coeffs[0] != 0,
            "division by zero polynomial"
        );

        let mut r = self.clone();
        while r.degree() >= deg_u && deg_u > 0 {
            let k = r.degree() - deg_u;
            let leading_r = r.coeffs[r.degree()];
            let inv = mod_inverse(u.coeffs[deg_u], u.modulus)
                .expect("leading coefficient must be invertible");
            let q = leading_r * inv % u.modulus;

            // r -= q · u · x^k
            for i in 0..=deg_u {
                let sub = u.coeffs[i] * q % r.modulus;
                r.coeffs[i + k] = (r.coeffs[i + k] + r.modulus - sub) % r.modulus;
            }
            r.trim();
        }
        if deg_u == 0 {
            // Everything is divisible by an invertible constant.
            return Self::zero(self.modulus);
        }
        r
    }

    /// Highest index with a non-zero coefficient.
    pub fn degree(&self) -> usize {
        let mut d = self.coeffs.len() - 1;
        while d > 0 && self.coeffs[d] == 0 {
            d -= 1;
        }
        d
    }
}

/// Extended Euclid on unsigned inputs, Bezout pair signed.
fn extended_gcd(a: u128, b: u128) -> (u128, i128, i128) {
    if b == 0 {
        (a, 1, 0)
    } else {
        let (g, x1, y1) = extended_gcd(b, a % b);
        (g, y1, x1 - (a / b) as i128 * y1)
    }
}

/// Inverse of `a` mod `modulus`, when it exists.
pub(crate) fn mod_inverse(a: u128, modulus: u128) -> Option<u128> {
    let (g, x, _) = extended_gcd(a % modulus, modulus);
    if g != 1 {
        None
    } else {
        let m = modulus as i128;
        Some(((x % m + m) % m) as u128)
    }
}

impl Add for &Polynomial {
    type Output = Polynomial;
    fn add(self, rhs: Self) -> Self::Output {
        let len = self.coeffs.len().max(rhs.coeffs.len());
        let mut v = vec![0; len];
        for i in 0..len {
            let a = self.coeffs.get(i).copied().unwrap_or(0);
            let b = rhs.coeffs.get(i).copied().unwrap_or(0);
            v[i] = (a + b) % self.modulus;
        }
        let mut result = Polynomial {
            coeffs: v,
            modulus: self.modulus,
        };
        result.trim();
        result
    }
}

impl Add for Polynomial {
    type Output = Polynomial;
    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl Add<&Polynomial> for Polynomial {
    type Output = Polynomial;
    fn add(self, rhs: &Polynomial) -> Self::Output {
        &self + rhs
    }
}

impl Add<Polynomial> for &Polynomial {
    type Output = Polynomial;
    fn add(self, rhs: Polynomial) -> Self::Output {
        self + &rhs
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;
    fn sub(self, rhs: Self) -> Self::Output {
        let len = self.coeffs.len().max(rhs.coeffs.len());
        let mut v = vec![0; len];
        for i in 0..len {
            let a = self.coeffs.get(i).copied().unwrap_or(0);
            let b = rhs.coeffs.get(i).copied().unwrap_or(0);
            v[i] = (self.modulus + a - b) % self.modulus;
        }
        let mut result = Polynomial {
            coeffs: v,
            modulus: self.modulus,
        };
        result.trim();
        result
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;
    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl Sub<&Polynomial> for Polynomial {
    type Output = Polynomial;
    fn sub(self, rhs: &Polynomial) -> Self::Output {
        &self - rhs
    }
}

impl Sub<Polynomial> for &Polynomial {
    type Output = Polynomial;
    fn sub(self, rhs: Polynomial) -> Self::Output {
        self - &rhs
    }
}

impl Neg for Polynomial {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Polynomial {
            coeffs: self
                .coeffs
                .iter()
                .map(|&x| (self.modulus - x) % self.modulus)
                .collect(),
            modulus: self.modulus,
        }
    }
}

impl<'a, 'b> Mul<&'b Polynomial> for &'a Polynomial {
    type Output = Polynomial;

    /// NTT 畳み込み + フォールバック O(n²) 乗算（参照 × 参照）
    fn mul(self, rhs: &'b Polynomial) -> Polynomial {
        assert_eq!(self.modulus, rhs.modulus, "moduli must match");
        let modu = self.modulus;

        let coeffs = if max(self.coeffs.len(), rhs.coeffs.len()) > NTT_THRESHOLD {
            ntt::convolve(&self.coeffs, &rhs.coeffs, modu)
        } else {
            let mut prod = vec![0u128; self.coeffs.len() + rhs.coeffs.len() - 1];
            for i in 0..self.coeffs.len() {
                for j in 0..rhs.coeffs.len() {
                    prod[i + j] = (prod[i + j] + self.coeffs[i] * rhs.coeffs[j]) % modu;
                }
            }
            prod
        };

        Polynomial::new(coeffs, modu)
    }
}

impl<'a> Mul<&'a Polynomial> for Polynomial {
    type Output = Polynomial;
    fn mul(self, rhs: &'a Polynomial) -> Polynomial {
        (&self).mul(rhs)
    }
}

impl<'a> Mul<Polynomial> for &'a Polynomial {
    type Output = Polynomial;
    fn mul(self, rhs: Polynomial) -> Polynomial {
        self.mul(&rhs)
    }
}

impl Mul<Polynomial> for Polynomial {
    type Output = Polynomial;
    fn mul(self, rhs: Polynomial) -> Polynomial {
        (&self).mul(&rhs)
    }
}

impl Rem<&Polynomial> for &Polynomial {
    type Output = Polynomial;
    fn rem(self, rhs: &Polynomial) -> Self::Output {
        self.rem_poly(rhs)
    }
}

impl Rem<Polynomial> for Polynomial {
    type Output = Polynomial;
    fn rem(self, rhs: Polynomial) -> Self::Output {
        &self % &rhs
    }
}

impl Rem<&Polynomial> for Polynomial {
    type Output = Polynomial;
    fn rem(self, rhs: &Polynomial) -> Self::Output {
        &self % rhs
    }
}

impl Rem<Polynomial> for &Polynomial {
    type Output = Polynomial;
    fn rem(self, rhs: Polynomial) -> Self::Output {
        self % &rhs
    }
}
