//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "tubelens=info,tubelens_sdk=info";

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `verbose`. Returns `false` if a subscriber was
/// already installed.
pub fn init_logging(verbose: bool) -> bool {
    let fallback = if verbose {
        "tubelens=debug,tubelens_sdk=debug"
    } else {
        DEFAULT_FILTER
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
