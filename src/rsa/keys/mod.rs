pub mod key_pair;

pub use key_pair::*;

use std::fmt::{Display, Formatter};
use num_bigint::BigUint;
use num_traits::{Num, One};
use serde::{Deserialize, Serialize};
use crate::rsa::error::{Result, RsaError};

/// Public exponent, the fourth Fermat prime `2^16 + 1`.
pub const E: u32 = 0x10001;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    #[serde(with = "decimal")]
    pub n: BigUint,
    #[serde(with = "decimal")]
    pub e: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKey {
    #[serde(with = "decimal")]
    pub n: BigUint,
    #[serde(with = "decimal")]
    pub d: BigUint,
}

fn check_modulus(n: &BigUint) -> Result<()> {
    if n <= &BigUint::one() {
        return Err(RsaError::InvalidKey(format!("modulus {} must be greater than 1", n)));
    }
    Ok(())
}

impl PublicKey {
    pub fn new(n: BigUint, e: BigUint) -> Result<Self> {
        check_modulus(&n)?;
        Ok(Self { n, e })
    }

    pub fn check(&self) -> Result<()> {
        check_modulus(&self.n)
    }
}

impl PrivateKey {
    pub fn new(n: BigUint, d: BigUint) -> Result<Self> {
        check_modulus(&n)?;
        Ok(Self { n, d })
    }

    pub fn check(&self) -> Result<()> {
        check_modulus(&self.n)
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PUBLIC KEY, {} bits, n: {}, e: {}", self.n.bits(), self.n, self.e)
    }
}

impl Display for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PRIVATE KEY, {} bits, n: {}", self.n.bits(), self.n)
    }
}

/// Parses decimal, or hexadecimal with a `0x` prefix.
pub fn parse_number(text: &str) -> std::result::Result<BigUint, String> {
    let text = text.trim();
    let (digits, radix) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(format!("invalid number `{}`", text));
    }
    BigUint::from_str_radix(digits, radix).map_err(|e| e.to_string())
}

/// Big integers as decimal strings in the serialized form.
mod decimal {
    use num_bigint::BigUint;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &BigUint, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        let text = String::deserialize(d)?;
        super::parse_number(&text).map_err(D::Error::custom)
    }
}
