//! Diagnostic tracing for the contacts CLI.
//!
//! Store events are emitted inside the span each `ContactStore` is built
//! with; this module only installs the subscriber that renders them.
//!
//! # Targets
//!
//! - `contacts::io::store`: file creation, reads, appends, rewrites and
//!   rejected requests, all inside a `contact_store` span carrying the file.
//! - `contacts::io::config`: where the config was loaded from.
//! - `contacts::commands`: delete confirmation answers (`debug`).

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=contacts::io::store=debug contacts list
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
