//! Subscriber setup for binaries
//!
//! Library code only emits `tracing` events. Binaries that want them printed
//! can call [`init`] once at startup; the filter comes from `RUST_LOG` and
//! defaults to `info`.

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber. Does nothing if one is already set.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
