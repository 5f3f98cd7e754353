//! # checkout-function
//!
//! ```bash
//! checkout-function quantity < input.json > output.json
//! checkout-function price    < input.json > output.json
//! ```
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - per-line eligibility decisions
//! - Default: INFO level (one summary line per run)

use std::io;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();

    let target = checkout_function::parse_target(std::env::args().nth(1).as_deref())?;
    checkout_function::run(target, io::stdin().lock(), io::stdout().lock())
}

/// Logs go to stderr; stdout carries the result document.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
