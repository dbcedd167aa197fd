use chrono::Local;
use log::debug;
use num_bigint::{BigUint, RandBigInt};
use num_traits::*;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use crate::rsa::config::CONFIG_DEF;
use crate::rsa::error::{Result, RsaError};
use crate::rsa::math::fast_modular_exponent;

const SMALL_PRIMES: [u32; 24] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Candidates tested between two deadline checks.
const EPOCH: u64 = 0xf;

/// Probabilistic primality test with `rounds` random witnesses.
pub fn miller_rabin(n: &BigUint, rounds: u32) -> bool {
    let two = BigUint::from(2u32);
    if n < &two { return false; }
    if n == &two { return true; }
    if !n.bit(0) { return false; }
    for p in SMALL_PRIMES {
        if (n % p).is_zero() { return *n == BigUint::from(p); }
    }
    let n_1: BigUint = n - 1u32;
    let s = n_1.trailing_zeros().unwrap_or(0);
    let d = &n_1 >> s;
    let mut rng = rand::thread_rng();
    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_1);
        let mut m = fast_modular_exponent(&a, &d, n);
        if m.is_one() || m == n_1 { continue; }
        for _ in 1..s {
            m = (&m * &m) % n;
            if m == n_1 { continue 'witness; }
        }
        return false;
    }
    true
}

/// Draws `bits / 8` bytes and reads them as a big-endian integer.
pub fn draw_candidate<R: RngCore + CryptoRng>(rng: &mut R, bits: u32) -> Result<BigUint> {
    let bytes = (bits / 8) as usize;
    if bytes == 0 {
        return Err(RsaError::InvalidKeySize(bits));
    }
    let mut buf = vec![0u8; bytes];
    rng.try_fill_bytes(&mut buf)
        .map_err(|e| RsaError::EntropySourceUnavailable(e.to_string()))?;
    Ok(BigUint::from_bytes_be(&buf))
}

#[derive(Debug, Clone)]
pub struct PrimeGenerator {
    /// Miller-Rabin rounds per candidate
    pub rounds: u32,
    /// Budget in ms for a single prime search, `<= 0` for unlimited
    pub time_max: i64,
}

impl Default for PrimeGenerator {
    fn default() -> Self {
        let r = CONFIG_DEF.get();
        Self { rounds: r.rounds, time_max: r.time_max }
    }
}

impl PrimeGenerator {
    pub fn new(rounds: u32, time_max: i64) -> Self {
        Self { rounds, time_max }
    }

    /// Smallest probable prime `>= candidate`.
    pub fn next_prime(&self, candidate: &BigUint) -> Result<BigUint> {
        let two = BigUint::from(2u32);
        if candidate <= &two { return Ok(two); }
        let start = Local::now().timestamp_millis();
        let mut test = candidate.clone();
        if !test.bit(0) { test += 1u32; }
        let mut try_times: u64 = 0;
        loop {
            try_times += 1;
            if miller_rabin(&test, self.rounds) {
                debug!("Done generation in {} tries after {} ms", try_times, Local::now().timestamp_millis() - start);
                return Ok(test);
            }
            if self.time_max > 0 && try_times % EPOCH == 0 {
                let time = Local::now().timestamp_millis() - start;
                if time > self.time_max {
                    debug!("Failed generation in {} tries after {} ms", try_times, time);
                    return Err(RsaError::Timeout(time));
                }
            }
            test += 2u32;
        }
    }

    pub fn generate_prime_with<R: RngCore + CryptoRng>(&self, rng: &mut R, bits: u32) -> Result<BigUint> {
        let candidate = draw_candidate(rng, bits)?;
        self.next_prime(&candidate)
    }

    /// Prime from `bits / 8` bytes of OS entropy, advanced to the next prime.
    /// Bits past the last whole byte are ignored.
    pub fn generate_prime(&self, bits: u32) -> Result<BigUint> {
        self.generate_prime_with(&mut OsRng, bits)
    }
}

/// Entropy source that always fails to read.
#[cfg(test)]
pub(crate) struct BrokenRng;

#[cfg(test)]
impl RngCore for BrokenRng {
    fn next_u32(&mut self) -> u32 { 0 }

    fn next_u64(&mut self) -> u64 { 0 }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {}

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        Err(rand::Error::new("entropy device unreadable"))
    }
}

#[cfg(test)]
impl CryptoRng for BrokenRng {}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use num_bigint::BigUint;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::rsa::error::RsaError;
    use super::{draw_candidate, miller_rabin, BrokenRng, PrimeGenerator};

    fn is_prime_naive(n: u64) -> bool {
        if n < 2 { return false; }
        (2..).take_while(|i| i * i <= n).all(|i| n % i != 0)
    }

    #[test]
    fn test_miller_rabin() {
        for x in 0u64..3000 {
            assert_eq!(miller_rabin(&BigUint::from(x), 10), is_prime_naive(x), "{}", x);
        }
        let res = (0xffffff00u32..0xffffffffu32)
            .filter(|x| miller_rabin(&BigUint::from(*x), 10))
            .collect::<Vec<_>>();
        assert!(res.iter().all(|x| is_prime_naive(*x as u64)));
        assert!(res.contains(&0xfffffffb));
    }

    #[test]
    fn test_miller_rabin_carmichael() {
        for c in [561u32, 1105, 1729, 2465, 2821, 6601, 8911, 41041, 825265] {
            assert!(!miller_rabin(&BigUint::from(c), 10), "{}", c);
        }
    }

    #[test]
    fn test_next_prime() -> Result<(), Box<dyn Error>> {
        let g = PrimeGenerator::new(10, 0);
        let cases = [(0u32, 2u32), (1, 2), (2, 2), (3, 3), (4, 5), (14, 17), (90, 97), (7920, 7927)];
        for (c, p) in cases {
            assert_eq!(g.next_prime(&BigUint::from(c))?, BigUint::from(p));
        }
        let m61: BigUint = (BigUint::from(1u32) << 61) - 1u32;
        assert_eq!(g.next_prime(&(&m61 - 10u32))?, m61);
        Ok(())
    }

    #[test]
    fn gen_prime() -> Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(0x1145_1419);
        let g = PrimeGenerator::new(10, 0);
        let prime = g.generate_prime_with(&mut rng, 128)?;
        assert!(prime.bits() <= 129);
        assert!(miller_rabin(&prime, 20));
        let prime = g.generate_prime(64)?;
        assert!(miller_rabin(&prime, 20));
        Ok(())
    }

    #[test]
    fn test_draw_candidate() -> Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(draw_candidate(&mut rng, 64)?.bits() <= 64);
        // truncated to whole bytes
        assert!(draw_candidate(&mut rng, 15)?.bits() <= 8);
        assert_eq!(draw_candidate(&mut rng, 7), Err(RsaError::InvalidKeySize(7)));
        Ok(())
    }

    #[test]
    fn test_entropy_unavailable() {
        let g = PrimeGenerator::new(10, 0);
        assert!(matches!(draw_candidate(&mut BrokenRng, 64), Err(RsaError::EntropySourceUnavailable(_))));
        match g.generate_prime_with(&mut BrokenRng, 64) {
            Err(RsaError::EntropySourceUnavailable(msg)) => assert!(msg.contains("unreadable"), "{}", msg),
            other => panic!("expected entropy error, got {:?}", other),
        }
    }

    #[test]
    fn test_timeout() {
        let g = PrimeGenerator::new(10, 1);
        // huge prime gap search with a 1 ms budget
        let start: BigUint = BigUint::from(1u32) << 4096;
        match g.next_prime(&start) {
            Err(RsaError::Timeout(t)) => assert!(t > 1),
            other => panic!("expected timeout, got {:?}", other.map(|p| p.bits())),
        }
    }
}
