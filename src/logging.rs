//! Diagnostic logging setup.
//!
//! Logs go to stderr so `--json` output on stdout stays parseable. `RUST_LOG`
//! takes priority over the level chosen on the command line.

use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const CRATE_TARGET: &str = "apisetu_transport";

/// Level implied by the `--verbose` flag.
#[must_use]
pub fn default_level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::WARN }
}

/// Filter directive used when `RUST_LOG` is unset.
#[must_use]
pub fn default_directive(level: Level) -> String {
    format!("warn,{CRATE_TARGET}={level}")
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let level = default_level(verbose);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;
    Ok(())
}
