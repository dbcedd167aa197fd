use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed, Zero};
use crate::rsa::error::{Result, RsaError};

/// Right-to-left binary exponentiation, `base ^ exponent mod modulus`.
///
/// Every intermediate product is reduced before it is kept, so nothing grows
/// past `modulus ^ 2`. Panics if `modulus` is zero.
pub fn fast_modular_exponent(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    let mut a = base % modulus;
    let mut q = exponent.clone();
    let mut r = BigUint::one() % modulus;
    while !q.is_zero() {
        if q.bit(0) { r = (r * &a) % modulus; }
        a = (&a * &a) % modulus;
        q >>= 1;
    }
    r
}

/// Multiplicative inverse of `a` modulo `n` by the iterative extended Euclid.
///
/// Fails with [`RsaError::NotInvertible`] when `gcd(a, n) != 1`.
pub fn mod_inverse(a: &BigUint, n: &BigUint) -> Result<BigUint> {
    let modulus = BigInt::from(n.clone());
    let (mut r, mut new_r) = (modulus.clone(), BigInt::from(a.clone()));
    let (mut y, mut new_y) = (BigInt::zero(), BigInt::one());
    while !new_r.is_zero() {
        let q = &r / &new_r;
        let next_r = &r - &q * &new_r;
        r = std::mem::replace(&mut new_r, next_r);
        let next_y = &y - &q * &new_y;
        y = std::mem::replace(&mut new_y, next_y);
    }
    if !r.is_one() {
        return Err(RsaError::NotInvertible);
    }
    if y.is_negative() { y += &modulus; }
    y.to_biguint().ok_or(RsaError::NotInvertible)
}

/// Euler's totient of `p * q` for primes `p`, `q`.
pub fn euler(p: &BigUint, q: &BigUint) -> BigUint {
    (p - 1u32) * (q - 1u32)
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use num::Integer;
    use num_bigint::BigUint;
    use num_traits::{One, Zero};
    use crate::rsa::error::RsaError;
    use super::{euler, fast_modular_exponent, mod_inverse};

    #[test]
    fn test_modpow_small() {
        let r = fast_modular_exponent(&BigUint::from(4u32), &BigUint::from(13u32), &BigUint::from(497u32));
        assert_eq!(r, BigUint::from(445u32));
    }

    #[test]
    fn test_modpow_brute_force() {
        for m in 1u32..40 {
            for b in 0u32..25 {
                for e in 0u32..12 {
                    let expect = BigUint::from(b).pow(e) % m;
                    let got = fast_modular_exponent(&BigUint::from(b), &BigUint::from(e), &BigUint::from(m));
                    assert_eq!(expect, got, "{}^{} mod {}", b, e, m);
                }
            }
        }
    }

    #[test]
    fn test_modpow_matches_num_bigint() {
        let b: BigUint = "123456789012345678901234567890".parse().unwrap();
        let e: BigUint = "65537".parse().unwrap();
        let m: BigUint = "74924929503799951536367992905751084593".parse().unwrap();
        assert_eq!(fast_modular_exponent(&b, &e, &m), b.modpow(&e, &m));
    }

    #[test]
    fn test_mod_inverse() -> Result<(), Box<dyn Error>> {
        for n in 2u32..200 {
            for a in 1u32..n {
                let (a, n) = (BigUint::from(a), BigUint::from(n));
                if a.gcd(&n).is_one() {
                    let d = mod_inverse(&a, &n)?;
                    assert!(d < n);
                    assert!(((&a * &d) % &n).is_one(), "{} * {} mod {}", a, d, n);
                } else {
                    assert_eq!(mod_inverse(&a, &n), Err(RsaError::NotInvertible));
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_mod_inverse_simple_data() -> Result<(), Box<dyn Error>> {
        let (p, q) = (BigUint::from(17u32), BigUint::from(11u32));
        let f = euler(&p, &q);
        assert_eq!(f, BigUint::from(160u32));
        let d = mod_inverse(&BigUint::from(7u32), &f)?;
        assert_eq!(d, BigUint::from(23u32));
        let n = &p * &q;
        let m = BigUint::from(88u32);
        let c = fast_modular_exponent(&m, &BigUint::from(7u32), &n);
        assert_eq!(fast_modular_exponent(&c, &d, &n), m);
        Ok(())
    }

    #[test]
    fn test_mod_inverse_not_invertible() {
        let r = mod_inverse(&BigUint::from(65537u32 * 3), &BigUint::from(65537u32 * 4));
        assert_eq!(r, Err(RsaError::NotInvertible));
        assert_eq!(mod_inverse(&BigUint::zero(), &BigUint::from(10u32)), Err(RsaError::NotInvertible));
    }
}
