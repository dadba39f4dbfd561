//! Tracing initialization and subscriber setup.
//!
//! Configures the subscriber pipeline from `tracing` macros to the log and
//! span files.

use std::path::Path;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::resource::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::exporter::{self, SERVICE_NAME};
use super::file_writer::FileWriter;
use crate::ObservabilityConfig;

pub const LOG_FILE: &str = "rentadmin.log";
pub const SPAN_FILE: &str = "rentadmin-spans.jsonl";

/// Initializes the tracing subscriber with file-based log and span output.
///
/// Sets up a subscriber that:
/// 1. Filters spans and events by level
/// 2. Writes formatted events to `rentadmin.log`
/// 3. Exports finished spans to `rentadmin-spans.jsonl`
///
/// # Level Resolution
///
/// 1. `RUST_LOG` if set and valid
/// 2. `config.trace_level`
/// 3. Default: `"info"`
///
/// # Initialization Behavior
///
/// - Creates the log directory if it doesn't exist
/// - Silently does nothing if the directory cannot be created (observability is optional)
/// - Only the first call takes effect
pub fn init_tracing(config: &ObservabilityConfig) {
    let log_dir = config
        .log_dir
        .clone()
        .unwrap_or_else(crate::infrastructure::paths::log_dir);
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }

    let _ = build_subscriber(env_filter(config), &log_dir).try_init();
}

fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    let level = config.trace_level.as_deref().unwrap_or("info");
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn build_subscriber(filter: EnvFilter, log_dir: &Path) -> impl tracing::Subscriber + Send + Sync {
    let resource = Resource::new(vec![
        opentelemetry::KeyValue::new("service.name", SERVICE_NAME),
        opentelemetry::KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);

    let provider = exporter::create_tracer_provider(FileWriter::new(log_dir.join(SPAN_FILE)), resource);
    let tracer = provider.tracer(SERVICE_NAME);
    opentelemetry::global::set_tracer_provider(provider);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(FileWriter::new(log_dir.join(LOG_FILE)))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(OpenTelemetryLayer::new(tracer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_and_spans_reach_their_files() {
        let dir = tempfile::tempdir().unwrap();
        let subscriber = build_subscriber(EnvFilter::new("debug"), dir.path());
        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::debug_span!("begin_fetch", resource = "vehicles");
            let _guard = span.enter();
            tracing::debug!(page = 2, "fetching");
        });

        let log = std::fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
        assert!(log.contains("fetching"));
        assert!(log.contains("page=2"));

        let spans = std::fs::read_to_string(dir.path().join(SPAN_FILE)).unwrap();
        assert!(spans.contains("\"name\":\"begin_fetch\""));
    }
}
