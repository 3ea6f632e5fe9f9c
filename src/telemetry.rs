//! Logging setup for binaries and tests embedding the indexer.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"info"`, or `"trio_index=debug"` for verbose runs).
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Default filter for a run, depending on the verbose flag.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "trio_index=debug"
    } else {
        "info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialisation_is_refused() {
        init_tracing(default_filter(false));
        assert!(!init_tracing(default_filter(true)));
        tracing::info!("subscriber installed");
    }
}
