use clap::Parser;
use romshelf::cli::{Cli, run};

fn main() -> anyhow::Result<()> {
    println!("Welcome to romshelf - cover art and removable media for your ROM library!");
    run(Cli::parse())
}
