use std::thread;
use chrono::Local;
use crossbeam_channel::bounded;
use log::{debug, info, warn};
use num_bigint::BigUint;
use num_traits::One;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use crate::rsa::config::CONFIG_DEF;
use crate::rsa::error::{Result, RsaError};
use crate::rsa::keys::{PrivateKey, PublicKey, E};
use crate::rsa::math::{euler, mod_inverse};
use crate::rsa::prime_gen::{draw_candidate, PrimeGenerator};

/// Both halves of one generation run, sharing the same `n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "KeyPairData")]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

#[derive(Deserialize)]
struct KeyPairData {
    public: PublicKey,
    private: PrivateKey,
}

impl TryFrom<KeyPairData> for KeyPair {
    type Error = RsaError;

    fn try_from(data: KeyPairData) -> Result<Self> {
        let pair = KeyPair { public: data.public, private: data.private };
        pair.check()?;
        Ok(pair)
    }
}

impl KeyPair {
    pub fn check(&self) -> Result<()> {
        self.public.check()?;
        self.private.check()?;
        if self.public.n != self.private.n {
            return Err(RsaError::InvalidKey("public and private halves have different moduli".to_string()));
        }
        Ok(())
    }

    /// Builds the key pair for primes `p`, `q` with `e = 65537`.
    pub fn from_primes(p: &BigUint, q: &BigUint) -> Result<Self> {
        let n = p * q;
        let f = euler(p, q);
        let e = BigUint::from(E);
        let d = mod_inverse(&e, &f)?;
        debug_assert!(((&d * &e) % &f).is_one());
        Ok(Self {
            public: PublicKey { n: n.clone(), e },
            private: PrivateKey { n, d },
        })
    }
}

#[derive(Debug, Clone)]
pub struct KeyPairGenerator {
    pub primes: PrimeGenerator,
    /// Draw fresh primes when `e` is not invertible modulo phi(n)
    pub retry: bool,
}

impl Default for KeyPairGenerator {
    fn default() -> Self {
        Self { primes: PrimeGenerator::default(), retry: CONFIG_DEF.get().retry }
    }
}

impl KeyPairGenerator {
    pub fn new(primes: PrimeGenerator, retry: bool) -> Self {
        Self { primes, retry }
    }

    pub fn generate_keypair(&self, bits: u32) -> Result<KeyPair> {
        self.generate_keypair_with(&mut OsRng, bits)
    }

    /// Two primes of `bits / 2 + 1` bits each, so that `n` reaches `bits`.
    pub fn generate_keypair_with<R: RngCore + CryptoRng>(&self, rng: &mut R, bits: u32) -> Result<KeyPair> {
        if bits < 16 {
            return Err(RsaError::InvalidKeySize(bits));
        }
        let prime_bits = bits / 2 + 1;
        self.generate_with_pairs(|| self.generate_prime_pair(rng, prime_bits))
    }

    /// Builds a key pair from the first usable `(p, q)` that `next` yields.
    fn generate_with_pairs(&self, mut next: impl FnMut() -> Result<(BigUint, BigUint)>) -> Result<KeyPair> {
        let start = Local::now().timestamp_millis();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (p, q) = next()?;
            if p == q {
                warn!("Attempt {}: drew the same prime twice, retrying", attempt);
                continue;
            }
            match KeyPair::from_primes(&p, &q) {
                Ok(pair) => {
                    info!("Generated {} bits key in {} attempts after {} ms",
                        pair.public.n.bits(), attempt, Local::now().timestamp_millis() - start);
                    return Ok(pair);
                }
                Err(RsaError::NotInvertible) if self.retry => {
                    warn!("Attempt {}: e not invertible modulo phi(n), retrying", attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Draws both candidates from `rng`, then searches the two primes concurrently.
    fn generate_prime_pair<R: RngCore + CryptoRng>(&self, rng: &mut R, bits: u32) -> Result<(BigUint, BigUint)> {
        let candidates = [draw_candidate(rng, bits)?, draw_candidate(rng, bits)?];
        let (tx, rx) = bounded(candidates.len());
        let handles = candidates.into_iter().enumerate().map(|(index, candidate)| {
            let tx = tx.clone();
            let primes = self.primes.clone();
            thread::spawn(move || {
                let _ = tx.send((index, primes.next_prime(&candidate)));
            })
        }).collect::<Vec<_>>();
        drop(tx);
        let mut res: Vec<(usize, Result<BigUint>)> = rx.iter().collect();
        for handle in handles {
            if let Err(e) = handle.join() { std::panic::resume_unwind(e); }
        }
        res.sort_by_key(|r| r.0);
        let mut res = res.into_iter().map(|r| r.1);
        match (res.next(), res.next()) {
            (Some(p), Some(q)) => {
                let (p, q) = (p?, q?);
                debug!("got primes: {} bits, {} bits", p.bits(), q.bits());
                Ok((p, q))
            }
            _ => unreachable!("both prime workers report before exiting"),
        }
    }
}

/// Key pair of `bits` bits with the default generator settings.
pub fn generate_keypair(bits: u32) -> Result<KeyPair> {
    KeyPairGenerator::default().generate_keypair(bits)
}
