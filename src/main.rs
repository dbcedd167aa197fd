use clap::Parser;
use log::{debug, LevelFilter};
use rsa_sig::RSA;

fn main() -> anyhow::Result<()> {
    let rsa = RSA::parse();
    env_logger::builder()
        .filter_level(if rsa.silent { LevelFilter::Off } else { LevelFilter::Info })
        .parse_default_env()
        .init();
    debug!("Run args: {:?}", rsa);
    rsa.run()
}
