use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "LABADAIN_LOG";

/// Installs the stderr subscriber. `default` applies when `LABADAIN_LOG` is unset.
pub fn init(default: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
