use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Diagnostic logs go to stderr, filtered by `RUST_LOG` (defaults to `warn` so the spinners
/// stay readable).
pub(crate) fn init_tracing() {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  let stderr_layer = fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(false)
    .compact();

  tracing_subscriber::registry()
    .with(env_filter)
    .with(stderr_layer)
    .init();
}
