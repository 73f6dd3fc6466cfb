use clap::Parser;
use turntable::cli::Args;

fn main() -> anyhow::Result<()> {
    turntable::run(Args::parse())
}
