//! Public surface for memedash.
//!
//! This crate re-exports the building blocks and provides a small logging
//! helper so the binary and embedders wire output the same way.

/// Re-export for convenience.
pub use memedash_config as config;
pub use memedash_core as core;
/// Re-export for convenience.
pub use memedash_protocol as protocol;
pub use memedash_tui as tui;

use anyhow::Context;
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::Path;

/// Initialize logging with env_logger.
///
/// The dashboard owns the terminal, so records only go to `log_file`. Without
/// one, logging stays off even when `RUST_LOG` is set.
pub fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    if let Some(mut builder) = logging_builder(log_file)? {
        let _ = builder.try_init();
    }
    Ok(())
}

/// Builder writing to `log_file`, or `None` when there is nowhere safe to log.
///
/// `RUST_LOG` only adjusts filters; the target is always the file.
fn logging_builder(log_file: Option<&Path>) -> anyhow::Result<Option<env_logger::Builder>> {
    let Some(path) = log_file else {
        return Ok(None);
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let mut builder = env_logger::builder();
    builder
        .format_timestamp_millis()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)));
    Ok(Some(builder))
}
