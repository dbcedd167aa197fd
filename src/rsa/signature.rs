//! Hash-then-sign without padding.
//!
//! The digest is read as a big-endian integer and halved until it is no longer
//! greater than `n`, then raised to `d`. This is not PKCS#1: signatures made here
//! do not verify against a standard RSA verifier, and the other way around.

use log::debug;
use num_bigint::BigUint;
use crate::rsa::codec::{decode, encode};
use crate::rsa::error::Result;
use crate::rsa::hash::HashAlgo;
use crate::rsa::keys::{PrivateKey, PublicKey};
use crate::rsa::math::fast_modular_exponent;

/// Drops low bits of `digest` until it fits under `n`.
pub fn reduce_digest(digest: &[u8], n: &BigUint) -> BigUint {
    let mut h = BigUint::from_bytes_be(digest);
    while &h > n { h >>= 1; }
    h
}

pub fn message_digest(message: &[u8], n: &BigUint, hash: HashAlgo) -> BigUint {
    reduce_digest(&hash.digest(message), n)
}

pub fn sign(key: &PrivateKey, message: &[u8], hash: HashAlgo) -> Result<String> {
    key.check()?;
    let h = message_digest(message, &key.n, hash);
    let sig = fast_modular_exponent(&h, &key.d, &key.n);
    Ok(encode(&sig))
}

/// `Ok(false)` for any mismatch, `Err` only for text that is not a signature at all.
pub fn verify(key: &PublicKey, message: &[u8], signature: &str, hash: HashAlgo) -> Result<bool> {
    key.check()?;
    let sig = decode(signature)?;
    if sig >= key.n {
        debug!("signature out of range for a {} bits modulus", key.n.bits());
        return Ok(false);
    }
    let h = message_digest(message, &key.n, hash);
    let recovered = fast_modular_exponent(&sig, &key.e, &key.n);
    let valid = recovered == h;
    debug!("verify with {}: {}", hash, if valid { "match" } else { "mismatch" });
    Ok(valid)
}

impl PrivateKey {
    pub fn sign(&self, message: &[u8], hash: HashAlgo) -> Result<String> {
        sign(self, message, hash)
    }
}

impl PublicKey {
    pub fn verify(&self, message: &[u8], signature: &str, hash: HashAlgo) -> Result<bool> {
        verify(self, message, signature, hash)
    }
}
