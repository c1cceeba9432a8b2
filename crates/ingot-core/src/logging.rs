//! `tracing` subscriber setup.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,ingot_assets=debug,notify=warn";

/// Install a global fmt subscriber. `RUST_LOG` overrides [`DEFAULT_FILTER`].
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Install a global fmt subscriber falling back to `default_filter`.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::trace!("Global subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_with_filter("warn");
        init();
        tracing::debug!("still logging");
    }
}
