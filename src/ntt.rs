//! Number-theoretic transform used by `Polynomial` past the length threshold.

// ------------------------------------------------------------
// 補助: pow / 逆元
// ------------------------------------------------------------
#[inline]
pub(crate) fn mod_pow(mut base: u128, mut exp: u128, modu: u128) -> u128 {
    let mut res = 1u128;
    base %= modu;
    while exp > 0 {
        if exp & 1 == 1 {
            res = res * base % modu;
        }
        base = base * base % modu;
        exp >>= 1;
    }
    res
}

/// Inverse modulo a prime (Fermat).
#[inline]
pub(crate) fn mod_inv(x: u128, modu: u128) -> u128 {
    mod_pow(x, modu - 2, modu)
}

// ------------------------------------------------------------
// primitive-root 探索
// ------------------------------------------------------------
fn factorize(mut n: u128) -> Vec<u128> {
    let mut f = Vec::new();
    let mut p = 2u128;
    while p * p <= n {
        if n % p == 0 {
            f.push(p);
            while n % p == 0 {
                n /= p;
            }
        }
        p += if p == 2 { 1 } else { 2 };
    }
    if n > 1 {
        f.push(n);
    }
    f
}

fn is_primitive_root(g: u128, modu: u128, factors: &[u128]) -> bool {
    factors.iter().all(|&p| mod_pow(g, (modu - 1) / p, modu) != 1)
}

fn find_primitive_root(modu: u128) -> u128 {
    let factors = factorize(modu - 1);
    let mut g = 2u128;
    loop {
        if is_primitive_root(g, modu, &factors) {
            return g;
        }
        g += 1;
    }
}

// ------------------------------------------------------------
// bit-reverse & NTT 本体
// ------------------------------------------------------------
fn bit_reverse(vec: &mut [u128]) {
    let n = vec.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            vec.swap(i, j);
        }
    }
}

/// in-place NTT / iNTT
fn ntt(a: &mut [u128], invert: bool, modu: u128, g: u128) {
    let n = a.len();
    bit_reverse(a);

    let mut len = 2;
    while len <= n {
        let w_len = mod_pow(g, (modu - 1) / len as u128, modu);
        let root = if invert { mod_inv(w_len, modu) } else { w_len };

        for i in (0..n).step_by(len) {
            let mut w = 1u128;
            for j in 0..len / 2 {
                let u = a[i + j];
                let v = a[i + j + len / 2] * w % modu;
                a[i + j] = (u + v) % modu;
                a[i + j + len / 2] = (u + modu - v) % modu;
                w = w * root % modu;
            }
        }
        len <<= 1;
    }

    if invert {
        let inv_n = mod_inv(n as u128, modu);
        for x in a.iter_mut() {
            *x = *x * inv_n % modu;
        }
    }
}

/// Convolution of two coefficient slices modulo an NTT-friendly prime.
///
/// The transform size is the next power of two past `a.len() + b.len() - 1`
/// and must divide `modu - 1`, so `modu` has to carry enough powers of two.
pub fn convolve(a: &[u128], b: &[u128], modu: u128) -> Vec<u128> {
    assert!(modu >= 3 && modu & 1 == 1, "modulus must be an odd prime");

    let need = a.len() + b.len() - 1;
    let mut ntt_len = 1usize;
    while ntt_len < need {
        ntt_len <<= 1;
    }
    assert_eq!(
        (modu - 1) % ntt_len as u128,
        0,
        "modulus admits no order-{ntt_len} root of unity"
    );

    let g = find_primitive_root(modu);

    let mut fa = vec![0u128; ntt_len];
    let mut fb = vec![0u128; ntt_len];
    fa[..a.len()].copy_from_slice(a);
    fb[..b.len()].copy_from_slice(b);

    ntt(&mut fa, false, modu, g);
    ntt(&mut fb, false, modu, g);
    for i in 0..ntt_len {
        fa[i] = fa[i] * fb[i] % modu;
    }
    ntt(&mut fa, true, modu, g);

    // 余剰ゼロを除去
    while fa.last() == Some(&0) && fa.len() > 1 {
        fa.pop();
    }
    fa
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{thread_rng, Rng};

    const Q: u128 = 29 * (1 << 57) + 1;

    fn schoolbook(a: &[u128], b: &[u128], modu: u128) -> Vec<u128> {
        let mut out = vec![0u128; a.len() + b.len() - 1];
        for (i, &x) in a.iter().enumerate() {
            for (j, &y) in b.iter().enumerate() {
                out[i + j] = (out[i + j] + x * y) % modu;
            }
        }
        while out.last() == Some(&0) && out.len() > 1 {
            out.pop();
        }
        out
    }

    #[test]
    fn test_mod_pow_and_inv() {
        assert_eq!(mod_pow(2, 5, 13), 6);
        assert_eq!(mod_pow(3, 7, 11), 9);
        let inv = mod_inv(12345, Q);
        assert_eq!(12345 * inv % Q, 1);
    }

    #[test]
    fn test_convolve_matches_schoolbook() {
        let mut rng = thread_rng();
        let a: Vec<u128> = (0..40).map(|_| rng.gen_range(0..Q)).collect();
        let b: Vec<u128> = (0..37).map(|_| rng.gen_range(0..Q)).collect();
        assert_eq!(convolve(&a, &b, Q), schoolbook(&a, &b, Q));
    }

    #[test]
    fn test_convolve_small() {
        // (1 + 2x)(3 + 4x) = 3 + 10x + 8x²
        assert_eq!(convolve(&[1, 2], &[3, 4], 97), vec![3, 10, 8]);
    }
}
