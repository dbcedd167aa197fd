use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RsaError {
    #[error("Public exponent is not invertible modulo phi(n)")]
    NotInvertible,

    #[error("Entropy source unavailable: {0}")]
    EntropySourceUnavailable(String),

    #[error("Malformed signature text: {0}")]
    MalformedSignatureText(String),

    #[error("Generation timeout after {0} ms")]
    Timeout(i64),

    #[error("Invalid key size `{0}` bits")]
    InvalidKeySize(u32),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, RsaError>;
