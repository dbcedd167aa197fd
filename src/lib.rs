//! RSA key generation and an unpadded hash-then-sign scheme with radix-36 signatures.

pub mod rsa;

pub use crate::rsa::*;
pub use crate::rsa::codec::{decode, encode};
pub use crate::rsa::error::{Result, RsaError};
pub use crate::rsa::hash::HashAlgo;
pub use crate::rsa::keys::{generate_keypair, KeyPair, KeyPairGenerator, PrivateKey, PublicKey, E};
pub use crate::rsa::math::{fast_modular_exponent, mod_inverse};
pub use crate::rsa::prime_gen::PrimeGenerator;
pub use crate::rsa::signature::{sign, verify};
