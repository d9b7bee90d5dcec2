//! stderr tracing subscriber.

use tracing_subscriber::EnvFilter;

/// Env var holding the log filter directive (e.g. `karma_core=debug`).
const LOG_ENV: &str = "KARMA_LOG";

/// Installs the global subscriber. `--verbose` overrides `KARMA_LOG`.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if let Err(e) = installed {
        eprintln!("Warning: failed to initialize logging: {e}");
    }
}
