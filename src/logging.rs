//! Tracing subscriber setup for hosts and tests.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! host's decision. [`init_tracing`] is a convenience for hosts that have
//! none of their own.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "phasecraft=info";

static TRACING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install a console subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once, and safe to call when another global
/// subscriber is already installed.
pub fn init_tracing() {
    TRACING_INITIALIZED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let result = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .try_init();

        if result.is_err() {
            tracing::debug!("Global tracing subscriber already installed; keeping it");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_repeatable() {
        init_tracing();
        init_tracing();
        tracing::info!(state = "Start", "logging works after repeated init");
    }
}
