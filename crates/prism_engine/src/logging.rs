//! Tracing subscriber setup for the intercepting process.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive that overrides the
/// default level.
pub const LOG_ENV: &str = "PRISM_LOG";

/// Installs the global subscriber, writing to stderr.
///
/// `PRISM_LOG` takes precedence; otherwise `verbose` selects `debug` and the
/// default is `warn`, so a quiet build prints only the host tools' own
/// diagnostics. Only the first call in a process takes effect.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .ok();
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}
