//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events; embedders decide where they go.
//! [`init_tracing`] installs the same fmt + `EnvFilter` subscriber the relay
//! binaries use, honouring `RUST_LOG` when it is set.

use crate::error::{RegistryError, Result};
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "forum_registry=info";

/// Installs a global fmt subscriber.
///
/// `default_directive` is used when `RUST_LOG` is unset or invalid. Returns
/// an error instead of panicking if a global subscriber is already set.
pub fn init_tracing(default_directive: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| RegistryError::config(format!("Failed to install tracing subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        // Another test may have installed a subscriber first; either way the
        // second call must fail cleanly.
        let _ = init_tracing(DEFAULT_DIRECTIVE);
        assert!(matches!(
            init_tracing("debug"),
            Err(RegistryError::Config(_))
        ));
    }
}
