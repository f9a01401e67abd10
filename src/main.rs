use {
    anyhow::Result,
    clap::Parser,
    noisy_ddpg::cli::{
        run,
        Args,
    },
};


fn main() -> Result<()> {
    run(Args::parse())
}
