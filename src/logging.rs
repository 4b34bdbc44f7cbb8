use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes console logging for the library.
///
/// Safe to call more than once; later calls are no-ops because a global
/// subscriber is already installed.
pub fn init() {
    // Respect RUST_LOG if set; otherwise default to verbose for our crate
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scrapedia=debug,info"));

    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stdout);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}
