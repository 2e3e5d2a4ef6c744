use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "member_import=info";

/// Install the console subscriber. `RUST_LOG` overrides the default level.
///
/// Calling it twice is harmless; the second call leaves the first subscriber in place.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init()
    {
        tracing::debug!(error = %e, "subscriber already installed");
    }
}
