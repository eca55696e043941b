use std::io;

use anyhow::{bail, Context};
use wisp::{Program, RunOptions};

// Logs go to stderr and only when RUST_LOG is set, e.g. `RUST_LOG=wisp=debug`
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true).with_level(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let program = match std::env::args().nth(1) {
        Some(path) if path == "-" => {
            Program::from_reader(io::stdin().lock()).context("Error reading stdin")?
        }
        Some(path) => Program::load(&path).with_context(|| format!("Error reading file {}", path))?,
        None => bail!("Usage: wisp [filename|-]"),
    };

    program.run(RunOptions::default()).context("Error running program")
}
