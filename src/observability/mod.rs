//! Structured logging and OpenTelemetry span export to local files.
//!
//! # Architecture
//!
//! ```text
//!                      ┌→ fmt layer ──────────→ FileWriter → rentadmin.log
//! tracing macros → EnvFilter
//!                      └→ tracing-opentelemetry → JsonLinesExporter → FileWriter → rentadmin-spans.jsonl
//! ```
//!
//! Both files live in the log directory (`[observability] log_dir`, default
//! `<data dir>/rentadmin/logs`) and rotate at 10 MB with 3 backups.
//!
//! # Configuration
//!
//! The level is controlled via:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `[observability] trace_level` in the config file
//! 3. Default: `"info"`
//!
//! # Modules
//!
//! - [`init`]: Subscriber setup
//! - [`exporter`]: JSON-lines span exporter
//! - [`file_writer`]: Rotating file writer with size-based rotation

mod exporter;
mod file_writer;
mod init;

pub use file_writer::FileWriter;
pub use init::{init_tracing, LOG_FILE, SPAN_FILE};
