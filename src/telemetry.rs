use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::configuration::LogSettings;

/// Initialize structured logging.
///
/// `RUST_LOG` takes precedence over the configured level. Output is JSON
/// lines on stdout unless `json` is off.
pub fn init_telemetry(settings: &LogSettings) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let json_layer = settings.json.then(|| fmt::layer().with_writer(std::io::stdout).json());
    let text_layer = (!settings.json).then(|| fmt::layer().with_writer(std::io::stdout));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
