//! Logging setup for the `sign_uefi` binary

use tracing_subscriber::EnvFilter;

/// Logging options, resolved once in `main`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogConfig {
    pub verbose: bool,
}

impl LogConfig {
    /// Filter used when `RUST_LOG` is not set
    pub fn default_directive(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

/// Install the stderr subscriber. Later calls are no-ops.
pub fn init(config: &LogConfig) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if result.is_err() {
        tracing::debug!("logging already initialised");
    }
}
