use std::fs::File;
use std::io;
use std::io::{Read, Write};
use std::time::Duration;
use anyhow::{anyhow, bail, Context};
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::{Rng, RngCore};
use rand::rngs::OsRng;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub mod codec;
pub mod config;
pub mod error;
pub mod hash;
pub mod keys;
pub mod math;
pub mod prime_gen;
pub mod signature;

use config::*;
use hash::HashAlgo;
use keys::*;
use prime_gen::PrimeGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Generate,
    Sign,
    Verify,
    Test,
}

#[macro_export]
macro_rules! rsa_t {
    ($CONFIG: expr, $NAME: ident) => {
#[derive(Debug, Clone, Parser)]
#[clap(version, about = "RSA hash-then-sign tool")]
pub struct $NAME {
    #[clap(short, long, value_parser, default_value = $CONFIG.mode.as_str(), help = "Run mode: generate, sign, verify, test")]
    pub mode: String,
    #[clap(short, long, value_parser, default_value = $CONFIG.key.as_str(), help = "Key pair / key JSON file used by sign and verify")]
    pub key: String,
    #[clap(short, long, value_parser, default_value = $CONFIG.input.as_str(), help = "Message filename")]
    pub input: String,
    #[clap(short, long, value_parser, default_value = $CONFIG.output.as_str(), help = "Output filename")]
    pub output: String,
    #[clap(long, value_parser, default_value = $CONFIG.signature.as_str(), help = "Signature text to verify")]
    pub signature: String,
    #[clap(short, long, value_parser, default_value_t = $CONFIG.bits, help = "Key size in bits")]
    pub bits: u32,
    #[clap(long, value_enum, default_value_t = $CONFIG.hash, help = "Message digest, must match between sign and verify")]
    pub hash: HashAlgo,
    #[clap(short, long, value_parser, default_value_t = $CONFIG.rounds, help = "Miller Rabin calculate rounds")]
    pub rounds: u32,
    #[clap(long, value_parser, default_value_t = $CONFIG.time_max, help = "Max time in mill seconds that trying to generate a prime, 0 for unlimited")]
    pub time_max: i64,
    #[clap(short, long, value_parser, default_value_t = $CONFIG.silent, help = "Disable log output")]
    pub silent: bool,
    #[clap(long, action = ArgAction::Set, default_value_t = $CONFIG.retry, help = "Retry with new primes when e is not invertible")]
    pub retry: bool,
    #[clap(long, value_parser, default_value_t = $CONFIG.checks, help = "Messages signed and verified in test mode")]
    pub checks: usize,
}
    };
}

rsa_t!(CONFIG_DEF, RSA);

impl RSA {
    pub fn get(&self) -> &RSA {
        self
    }

    fn run_mode(&self) -> anyhow::Result<RunMode> {
        match self.mode.as_str() {
            "generate" => Ok(RunMode::Generate),
            "sign" => Ok(RunMode::Sign),
            "verify" => Ok(RunMode::Verify),
            "test" => Ok(RunMode::Test),
            m => Err(anyhow!("Unknown run mode `{}`! available: generate(default), sign, verify, test", m)),
        }
    }

    pub fn generator(&self) -> KeyPairGenerator {
        KeyPairGenerator::new(PrimeGenerator::new(self.rounds, self.time_max), self.retry)
    }

    fn progress_bar(&self, len: Option<u64>) -> anyhow::Result<Option<ProgressBar>> {
        if self.silent { return Ok(None); }
        let pb = match len {
            Some(len) => {
                let pb = ProgressBar::new(len);
                pb.set_style(ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")?
                    .progress_chars("#>-"));
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")?);
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
        };
        Ok(Some(pb))
    }

    pub fn generate_key(&self) -> anyhow::Result<KeyPair> {
        let pb = self.progress_bar(None)?;
        if let Some(pb) = &pb {
            pb.set_message(format!("generating {} bits key", self.bits));
        }
        let res = self.generator().generate_keypair(self.bits);
        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        Ok(res?)
    }

    pub fn read_input(&self) -> anyhow::Result<Vec<u8>> {
        let mut data = Vec::new();
        match self.input.as_str() {
            "stdin" => io::stdin().read_to_end(&mut data),
            f => File::open(f).with_context(|| format!("open input `{}`", f))?.read_to_end(&mut data),
        }?;
        Ok(data)
    }

    pub fn write_output(&self, text: &str) -> anyhow::Result<()> {
        let mut writer: Box<dyn Write> = match self.output.as_str() {
            "stdout" => Box::new(io::stdout()),
            f => Box::new(File::create(f).with_context(|| format!("create output `{}`", f))?),
        };
        writer.write_all(text.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a bare key, or the `field` half of a key pair file.
    /// A key pair file must have matching halves.
    pub fn read_key<T: DeserializeOwned>(&self, field: &str) -> anyhow::Result<T> {
        let file = File::open(&self.key).with_context(|| format!("open key `{}`", self.key))?;
        let mut value: serde_json::Value = serde_json::from_reader(file)?;
        if value.get("public").is_some() && value.get("private").is_some() {
            KeyPair::deserialize(&value).with_context(|| format!("invalid key pair `{}`", self.key))?;
        }
        if value.get(field).is_some() {
            value = value[field].take();
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Signs and verifies random messages with a fresh key, including tampered copies.
    pub fn self_test(&self, pair: &KeyPair) -> anyhow::Result<()> {
        let pb = self.progress_bar(Some(self.checks as u64))?;
        let mut rng = OsRng;
        for _ in 0..self.checks {
            let mut message = vec![0u8; rng.gen_range(0..256)];
            rng.fill_bytes(&mut message);
            let sig = pair.private.sign(&message, self.hash)?;
            if !pair.public.verify(&message, &sig, self.hash)? {
                bail!("signature {} does not verify", sig);
            }
            let mut tampered = message.clone();
            tampered.push(rng.gen());
            if pair.public.verify(&tampered, &sig, self.hash)? {
                bail!("signature {} verifies a tampered message", sig);
            }
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }
        if let Some(pb) = &pb {
            pb.finish_with_message("Test pass");
        }
        Ok(())
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match self.run_mode()? {
            RunMode::Generate => {
                let pair = self.generate_key()?;
                info!("{}", pair.public);
                self.write_output(&serde_json::to_string_pretty(&pair)?)?;
            }
            RunMode::Sign => {
                let key: PrivateKey = self.read_key("private")?;
                let message = self.read_input()?;
                let sig = key.sign(&message, self.hash)?;
                info!("signed {} bytes with {}", message.len(), self.hash);
                self.write_output(&sig)?;
            }
            RunMode::Verify => {
                if self.signature.is_empty() { bail!("Missing `--signature`"); }
                let key: PublicKey = self.read_key("public")?;
                let message = self.read_input()?;
                if key.verify(&message, self.signature.trim(), self.hash)? {
                    self.write_output("valid")?;
                } else {
                    self.write_output("invalid")?;
                    bail!("Signature does not match the message");
                }
            }
            RunMode::Test => {
                let pair = self.generate_key()?;
                info!("{}", pair.public);
                self.self_test(&pair)?;
                info!("Test pass");
            }
        }
        Ok(())
    }
}
