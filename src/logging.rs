//! Structured logging setup.
//!
//! Output goes to stderr. `RUST_LOG` overrides the default filter using the
//! usual `EnvFilter` directive syntax, e.g. `medshare=debug,tower_http=info`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "medshare=info,medshare_server=info";

/// Installs the global subscriber. Returns false when one was already set.
pub fn init_logging(default_filter: &str) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok()
}
