//! Console logging for hosts that want it.
//!
//! The library only emits `tracing` events; nothing is printed until a
//! subscriber is installed.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor an explicit filter is given.
pub const DEFAULT_LOG_FILTER: &str = "pillbox_core=info";

/// Install a formatting subscriber.
///
/// `RUST_LOG` wins over `filter`. Returns false when a global subscriber was
/// already installed, which makes repeat calls harmless.
pub fn init_logging(filter: Option<&str>) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter.unwrap_or(DEFAULT_LOG_FILTER)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        init_logging(Some("pillbox_core=debug"));
        assert!(!init_logging(None));
    }
}
