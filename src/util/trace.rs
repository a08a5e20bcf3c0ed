//! Creates a `tracing_subscriber` pipeline which writes spans
//! emitted by the conflation run to standard output, filtered
//! by the `RUST_LOG` environment variable.
//!
//! ```bash
//! RUST_LOG=conflate=debug
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialises the tracer, using tracing subscription.
/// This is optional, not calling this function will simply
/// not log traces.
pub fn initialize_tracer() {
    let fmt_layer = tracing_subscriber::fmt::layer().compact();

    // Initialise tracing with subscribers and environment filter
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(fmt_layer)
        .init();
}
