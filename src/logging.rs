//! Tracing initialisation for binaries and tests embedding the order engine

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a formatted subscriber filtered by `RUST_LOG`
///
/// Falls back to `default_directive` (e.g. `"catering=info"`) when `RUST_LOG`
/// is unset or invalid. Calling it again once a subscriber is installed does
/// nothing and returns `false`.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
