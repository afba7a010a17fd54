//! `pkgconfig` command: print the resolved configuration of a package.

use clap::Parser;
use pkgconfig_rs::cli::{self, Cli};
use std::io::Write;

fn main() -> anyhow::Result<()> {
    pkgconfig_rs::init_logging();

    let cli = Cli::parse();
    let output = cli::run(&cli, |key| std::env::var(key).ok())?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}
