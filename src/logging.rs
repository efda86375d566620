//! Tracing setup (C10).
//!
//! A library does not own the process's logging sink, so this module only
//! offers an opt-in initializer for binaries and examples embedding this
//! crate directly; every span/event elsewhere in the crate is emitted
//! through `tracing` regardless of whether a subscriber is ever installed.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a `tracing_subscriber::fmt` layer filtered by `RUST_LOG`,
/// falling back to `modbus_rtu_client=info` when the variable is unset or
/// fails to parse.
pub fn init_tracing() -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("modbus_rtu_client=info"));

    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true);

    tracing_subscriber::registry().with(env_filter).with(layer).try_init()
}
