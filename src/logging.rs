//! Tracing subscriber bootstrap
//!
//! The library only emits `tracing` events; binaries and tests that want to
//! see them call [`init_tracing`] once.

use crate::error::{Error, Result};
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// A second call fails with [`Error::Tracing`] instead of panicking.
pub fn init_tracing() -> Result<()> {
    init_tracing_with_default("info")
}

/// Like [`init_tracing`] with a custom fallback directive.
pub fn init_tracing_with_default(default_directive: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    Registry::default()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Tracing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error() {
        // Another test may already have installed a subscriber; either way
        // the second call here must fail without panicking.
        let _ = init_tracing();
        let err = init_tracing().unwrap_err();
        assert!(matches!(err, Error::Tracing(_)));
    }
}
