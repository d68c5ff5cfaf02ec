use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured stdout tracing. Call once at service startup.
/// Uses JSON format with env-filter (`RUST_LOG`), falling back to
/// `default_directive` when `RUST_LOG` is unset or unparsable.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .try_init();
}
