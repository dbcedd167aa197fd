use num_bigint::BigUint;
use num_traits::Num;
use crate::rsa::error::{Result, RsaError};

pub const RADIX: u32 = 36;

/// Signature integer as upper-case radix-36 text, no prefix or padding.
pub fn encode(sig: &BigUint) -> String {
    sig.to_str_radix(RADIX).to_uppercase()
}

/// Inverse of [`encode`]. Only `[0-9A-Z]` is accepted.
pub fn decode(text: &str) -> Result<BigUint> {
    if text.is_empty() {
        return Err(RsaError::MalformedSignatureText("empty signature".to_string()));
    }
    if let Some((idx, c)) = text.char_indices().find(|(_, c)| !(c.is_ascii_digit() || c.is_ascii_uppercase())) {
        return Err(RsaError::MalformedSignatureText(format!("invalid character `{}` at {}", c, idx)));
    }
    BigUint::from_str_radix(text, RADIX)
        .map_err(|e| RsaError::MalformedSignatureText(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use num_bigint::BigUint;
    use num_traits::{One, Zero};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use num_bigint::RandBigInt;
    use crate::rsa::error::RsaError;
    use super::{decode, encode};

    #[test]
    fn test_encode_known() -> Result<(), Box<dyn Error>> {
        assert_eq!(encode(&BigUint::zero()), "0");
        assert_eq!(encode(&BigUint::from(35u32)), "Z");
        assert_eq!(encode(&BigUint::from(36u32)), "10");
        let n: BigUint = "1679615".parse()?;
        assert_eq!(encode(&n), "ZZZZ");
        Ok(())
    }

    #[test]
    fn test_decode_roundtrip() -> Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(36);
        let n: BigUint = "74924929503799951536367992905751084593".parse()?;
        for _ in 0..64 {
            let x = rng.gen_biguint_below(&n);
            assert_eq!(decode(&encode(&x))?, x);
        }
        let last = &n - BigUint::one();
        assert_eq!(decode(&encode(&last))?, last);
        Ok(())
    }

    #[test]
    fn test_decode_malformed() {
        for bad in ["", "1fa3", "1FA-3", "1_000", "+1", " 1", "Ä"] {
            match decode(bad) {
                Err(RsaError::MalformedSignatureText(_)) => {}
                other => panic!("`{}` decoded to {:?}", bad, other),
            }
        }
    }
}
