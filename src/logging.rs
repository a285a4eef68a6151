//! Tracing initialization.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "squid_bytecode=info";
const VERBOSE_FILTER: &str = "squid_bytecode=debug";

/// Install the fmt subscriber. `SQUID_LOG` overrides the default filter,
/// e.g. `SQUID_LOG=squid_bytecode::domain::provider=debug`.
///
/// Only the first call has an effect. Logs go to stderr so report output on
/// stdout stays machine-readable.
pub fn init_tracing(verbose: bool) {
    INIT.call_once(|| {
        let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
        let filter =
            EnvFilter::try_from_env("SQUID_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    });
}
