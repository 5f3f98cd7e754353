//! # Checkout Function
//!
//! Process plumbing around [`tierline_core::run_function`]: read the input
//! document, run the requested target, write the result document.
//!
//! The same binary serves both checkout functions; the target is chosen by
//! the first argument (`quantity` or `price`), so a QUANTITY configuration
//! accidentally attached to the PRICE function fails loudly instead of
//! discounting the wrong way.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use tracing::error;

use tierline_core::{run_function, DiscountKind, FunctionInput};

/// Runs one function invocation over arbitrary reader and writer.
///
/// ## Errors
/// Input that cannot be read or parsed, and every [`tierline_core::CoreError`]
/// from the engine. Nothing is written to `output` on error.
pub fn run<R: Read, W: Write>(target: DiscountKind, mut input: R, mut output: W) -> Result<()> {
    let mut document = String::new();
    input
        .read_to_string(&mut document)
        .context("Failed to read function input")?;

    let parsed = FunctionInput::from_json(&document)?;

    let result = run_function(target, &parsed).map_err(|e| {
        error!(error = %e, %target, "Checkout function failed");
        e
    })?;

    serde_json::to_writer(&mut output, &result).context("Failed to write function result")?;
    output.flush().context("Failed to flush function result")?;
    Ok(())
}

/// Parses the target argument.
pub fn parse_target(arg: Option<&str>) -> Result<DiscountKind> {
    let arg = arg.context("Missing function target (expected 'quantity' or 'price')")?;
    Ok(arg.parse::<DiscountKind>()?)
}
