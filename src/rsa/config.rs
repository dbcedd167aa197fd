use lazy_static::lazy_static;
use crate::rsa::hash::HashAlgo;
use crate::RSA;

lazy_static! {
    pub static ref CONFIG_DEF: RSA = RSA {
        mode: String::from("generate"),
        key: String::from("key.json"),
        input: String::from("stdin"),
        output: String::from("stdout"),
        signature: String::new(),
        bits: 1024,
        hash: HashAlgo::Sha384,
        rounds: 10,
        // unlimited
        time_max: 0,
        silent: false,
        retry: true,
        checks: 16,
    };
}
