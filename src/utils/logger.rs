//! Subscriber setup for the maintenance CLI.
//!
//! Logs go to stderr so records printed on stdout stay machine-readable.
//! `RUST_LOG` overrides the default filter in both formats.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATE_TARGET: &str = "ministry_data";

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new(format!("{}=debug,info", CRATE_TARGET))
        } else {
            EnvFilter::new(format!("{}=info,warn", CRATE_TARGET))
        }
    })
}

/// Compact human-readable output. `verbose` enables debug events from this crate.
pub fn init_cli_logger(verbose: bool) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact();

    if tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("global subscriber already set, keeping it");
    }
}

/// One JSON object per event. Diagnostic fields such as `legacy` and
/// `canonical` become top-level keys.
pub fn init_json_logger() {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .json()
        .flatten_event(true)
        .with_current_span(false);

    if tracing_subscriber::registry()
        .with(env_filter(false))
        .with(layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("global subscriber already set, keeping it");
    }
}
