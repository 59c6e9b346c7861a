use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "careeros_engine=debug";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_filter`. With `json` set, events are
/// written as one JSON object per line. Returns `false` if a subscriber was
/// already installed, so repeated calls from tests are harmless.
pub fn init_tracing(default_filter: &str, json: bool) -> bool {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .try_init()
        .is_ok()
}
