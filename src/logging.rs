//! Diagnostic tracing for the chain engine.
//!
//! Progress the user asked for (stage executions, the final outcome) is
//! printed by the commands themselves. This module only wires `tracing`
//! output to stderr, filtered by `RUST_LOG`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the filter is `warn`, or
/// `chainwatch=debug` when `verbose` is requested.
pub fn init(verbose: bool) {
    let default = if verbose { "chainwatch=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests, embedding) is harmless; keep the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
