use std::fmt::{Display, Formatter};
use std::str::FromStr;
use clap::ValueEnum;
use digest::Digest;
use serde::{Deserialize, Serialize};

/// Digest applied to a message before it is reduced and signed.
/// Signer and verifier have to agree on it, a mismatch only shows up as a failed verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgo {
    Sha1,
    Sha224,
    Sha256,
    #[default]
    Sha384,
    Sha512,
}

impl HashAlgo {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgo::Sha1 => "sha1",
            HashAlgo::Sha224 => "sha224",
            HashAlgo::Sha256 => "sha256",
            HashAlgo::Sha384 => "sha384",
            HashAlgo::Sha512 => "sha512",
        }
    }

    pub fn output_bits(&self) -> usize {
        match self {
            HashAlgo::Sha1 => 160,
            HashAlgo::Sha224 => 224,
            HashAlgo::Sha256 => 256,
            HashAlgo::Sha384 => 384,
            HashAlgo::Sha512 => 512,
        }
    }

    pub fn digest(&self, message: &[u8]) -> Vec<u8> {
        match self {
            HashAlgo::Sha1 => sha1::Sha1::digest(message).to_vec(),
            HashAlgo::Sha224 => sha2::Sha224::digest(message).to_vec(),
            HashAlgo::Sha256 => sha2::Sha256::digest(message).to_vec(),
            HashAlgo::Sha384 => sha2::Sha384::digest(message).to_vec(),
            HashAlgo::Sha512 => sha2::Sha512::digest(message).to_vec(),
        }
    }
}

impl Display for HashAlgo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_lowercase().replace('-', "");
        [HashAlgo::Sha1, HashAlgo::Sha224, HashAlgo::Sha256, HashAlgo::Sha384, HashAlgo::Sha512]
            .into_iter()
            .find(|h| h.name() == s)
            .ok_or_else(|| format!("Unknown hash algorithm `{}`", s))
    }
}
