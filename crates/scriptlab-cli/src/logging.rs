//! Diagnostic tracing for the `scriptlab` binary.
//!
//! Diagnostics go to stderr and are controlled by `RUST_LOG`; script
//! output and tutorial text always go to stdout regardless of the filter.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Defaults to `warn` when `RUST_LOG` is
/// unset or invalid.
///
/// ```bash
/// RUST_LOG=scriptlab_eval=debug scriptlab run hello.js
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
