use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global subscriber.
/// `RUST_LOG` picks the filter (default `info`); `LOG_FORMAT=json` switches to
/// one JSON object per line.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    // Already installed (tests, embedding binaries) is fine.
    if let Err(e) = res {
        tracing::debug!("tracing already initialized: {e}");
    }
}
