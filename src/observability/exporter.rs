//! File-based OpenTelemetry span exporter.
//!
//! Each finished span becomes one JSON object on its own line:
//!
//! ```json
//! {"start":"2026-03-01T10:00:00.000000Z","durationMicros":1834,"traceId":"4bf9...",
//!  "spanId":"00f0...","parentSpanId":null,"name":"fetch_list","service":"rentadmin",
//!  "attributes":{"resource":"vehicles","page":1},"events":[],"status":"unset"}
//! ```
//!
//! Lines can be filtered with `jq` by `traceId` to follow a single command
//! from the console through the worker to the HTTP request.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::future::BoxFuture;
use opentelemetry::trace::{SpanId, Status, TraceError};
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::trace::TracerProvider;
use serde_json::{json, Map, Value as JsonValue};

use super::file_writer::FileWriter;

pub(crate) const SERVICE_NAME: &str = "rentadmin";

/// Writes span batches to a rotating JSON-lines file.
struct JsonLinesExporter {
    writer: FileWriter,
    service: String,
    is_shutdown: AtomicBool,
}

impl JsonLinesExporter {
    fn new(writer: FileWriter, resource: &Resource) -> Self {
        let service = resource
            .get(opentelemetry::Key::from_static_str("service.name"))
            .map_or_else(|| SERVICE_NAME.to_string(), |value| value.as_str().into_owned());
        Self {
            writer,
            service,
            is_shutdown: AtomicBool::new(false),
        }
    }
}

impl SpanExporter for JsonLinesExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        if self.is_shutdown.load(Ordering::SeqCst) {
            return Box::pin(std::future::ready(Err(TraceError::from("exporter is shut down"))));
        }

        let result = batch
            .iter()
            .map(|span| format_span(span, &self.service).to_string())
            .try_for_each(|line| self.writer.write_line(&line))
            .map_err(|e| TraceError::from(e.to_string()));

        Box::pin(std::future::ready(result))
    }

    fn shutdown(&mut self) {
        self.is_shutdown.store(true, Ordering::SeqCst);
    }

    fn set_resource(&mut self, res: &Resource) {
        if let Some(value) = res.get(opentelemetry::Key::from_static_str("service.name")) {
            self.service = value.as_str().into_owned();
        }
    }
}

impl std::fmt::Debug for JsonLinesExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesExporter")
            .field("writer", &self.writer)
            .field("service", &self.service)
            .field("is_shutdown", &self.is_shutdown)
            .finish()
    }
}

/// Builds a tracer provider exporting every finished span immediately.
pub fn create_tracer_provider(writer: FileWriter, resource: Resource) -> TracerProvider {
    let exporter = JsonLinesExporter::new(writer, &resource);

    TracerProvider::builder()
        .with_config(opentelemetry_sdk::trace::Config::default().with_resource(resource))
        .with_simple_exporter(exporter)
        .build()
}

fn format_span(span: &SpanData, service: &str) -> JsonValue {
    let start: DateTime<Utc> = span.start_time.into();
    let duration = span
        .end_time
        .duration_since(span.start_time)
        .unwrap_or_default();
    let parent = (span.parent_span_id != SpanId::INVALID).then(|| format!("{:016x}", span.parent_span_id));

    let events: Vec<JsonValue> = span
        .events
        .iter()
        .map(|event| {
            let at: DateTime<Utc> = event.timestamp.into();
            json!({
                "at": at.to_rfc3339_opts(SecondsFormat::Micros, true),
                "name": event.name,
                "attributes": format_attributes(&event.attributes),
            })
        })
        .collect();

    json!({
        "start": start.to_rfc3339_opts(SecondsFormat::Micros, true),
        "durationMicros": u64::try_from(duration.as_micros()).unwrap_or(u64::MAX),
        "traceId": format!("{:032x}", span.span_context.trace_id()),
        "spanId": format!("{:016x}", span.span_context.span_id()),
        "parentSpanId": parent,
        "name": span.name,
        "service": service,
        "attributes": format_attributes(&span.attributes),
        "events": events,
        "status": format_status(&span.status),
    })
}

fn format_attributes(attributes: &[KeyValue]) -> JsonValue {
    let map: Map<String, JsonValue> = attributes
        .iter()
        .map(|kv| (kv.key.to_string(), format_value(&kv.value)))
        .collect();
    JsonValue::Object(map)
}

fn format_value(value: &Value) -> JsonValue {
    match value {
        Value::Bool(b) => json!(b),
        Value::I64(i) => json!(i),
        Value::F64(f) => json!(f),
        Value::String(s) => json!(s.as_str()),
        Value::Array(_) => json!(value.to_string()),
    }
}

fn format_status(status: &Status) -> String {
    match status {
        Status::Unset => "unset".to_string(),
        Status::Ok => "ok".to_string(),
        Status::Error { description } => format!("error: {description}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{Span, Tracer, TracerProvider as _};

    #[test]
    fn finished_spans_become_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spans.jsonl");
        let resource = Resource::new(vec![KeyValue::new("service.name", "rentadmin-test")]);
        let provider = create_tracer_provider(FileWriter::new(path.clone()), resource);

        let tracer = provider.tracer("test");
        let mut span = tracer.start("fetch_list");
        span.set_attribute(KeyValue::new("resource", "vehicles"));
        span.set_attribute(KeyValue::new("page", 2_i64));
        span.end();

        let contents = std::fs::read_to_string(path).unwrap();
        let line: JsonValue = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(line["name"], "fetch_list");
        assert_eq!(line["service"], "rentadmin-test");
        assert_eq!(line["attributes"]["resource"], "vehicles");
        assert_eq!(line["attributes"]["page"], 2);
        assert_eq!(line["parentSpanId"], JsonValue::Null);
        assert_eq!(line["traceId"].as_str().unwrap().len(), 32);
    }
}
