//! Worker message types for communication between the event loop and background tasks.
//!
//! This module defines the request and response protocol between the listing
//! event loop and the worker that performs network calls, timers and upload
//! bookkeeping. It also implements distributed tracing context propagation
//! across task boundaries and towards the backend.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::debounce::Ticket;
use crate::domain::{ResourceKind, StatusChange};
use crate::fetch::{FetchError, ListData, QueryKey, RequestId};

/// Distributed tracing context for cross-task span propagation.
///
/// Captures the current trace and span IDs from OpenTelemetry to maintain
/// trace continuity when passing messages to the worker and when calling the
/// backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// OpenTelemetry trace ID as a hex string.
    pub trace_id: String,

    /// Parent span ID for linking spans across tasks.
    pub parent_span_id: String,
}

impl TraceContext {
    /// Creates a trace context from the current tracing span.
    ///
    /// Extracts the OpenTelemetry trace ID and span ID from the active span.
    /// Returns `None` if the current span context is invalid or not sampled.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rentadmin::worker::TraceContext;
    ///
    /// let context = TraceContext::from_current();
    /// if let Some(ctx) = context {
    ///     println!("Trace ID: {}", ctx.trace_id);
    /// }
    /// ```
    pub fn from_current() -> Option<Self> {
        use opentelemetry::trace::TraceContextExt;
        use tracing_opentelemetry::OpenTelemetrySpanExt;

        let span = tracing::Span::current();

        let otel_context = span.context();
        let span_ref = otel_context.span();
        let span_context = span_ref.span_context();

        if span_context.is_valid() {
            let trace_id_str = format!("{:032x}", span_context.trace_id());
            let parent_span_id_str = format!("{:016x}", span_context.span_id());

            tracing::trace!(
                trace_id = %trace_id_str,
                parent_span_id = %parent_span_id_str,
                "capturing trace context"
            );

            Some(Self {
                trace_id: trace_id_str,
                parent_span_id: parent_span_id_str,
            })
        } else {
            tracing::trace!("span context is not valid");
            None
        }
    }

    /// W3C `traceparent` header value for this context.
    ///
    /// ```
    /// use rentadmin::worker::TraceContext;
    ///
    /// let context = TraceContext {
    ///     trace_id: "4bf92f3577b34da6a3ce929d0e0e4736".to_string(),
    ///     parent_span_id: "00f067aa0ba902b7".to_string(),
    /// };
    /// assert_eq!(
    ///     context.traceparent(),
    ///     "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
    /// );
    /// ```
    #[must_use]
    pub fn traceparent(&self) -> String {
        format!("00-{}-{}-01", self.trace_id, self.parent_span_id)
    }
}

/// Macro to generate builder methods for `WorkerMessage` variants.
///
/// Generates convenience constructors that automatically attach the current
/// trace context to each message variant.
macro_rules! worker_message_builders {
    (
        $(
            $builder_name:ident($variant:ident { $($field:ident: $ty:ty),* $(,)? })
        ),* $(,)?
    ) => {
        impl WorkerMessage {
            $(
                #[doc = concat!("Create a ", stringify!($variant), " message with current trace context")]
                pub fn $builder_name($($field: $ty),*) -> Self {
                    Self::$variant {
                        $($field,)*
                        trace_context: TraceContext::from_current(),
                    }
                }
            )*
        }
    };
}

worker_message_builders! {
    fetch_list(FetchList { key: QueryKey, request: RequestId, force: bool }),
    schedule_debounce(ScheduleDebounce { ticket: Ticket, delay: Duration }),
    update_status(UpdateStatus { resource: ResourceKind, change: StatusChange }),
    delete_record(DeleteRecord { resource: ResourceKind, id: String }),
    invalidate(Invalidate { resource: ResourceKind }),
    upload_file(UploadFile { field: String, path: PathBuf }),
    remove_upload(RemoveUpload { field: String, url: String }),
    settle_uploads(SettleUploads { field: String, saved: bool }),
    reconcile_uploads(ReconcileUploads {}),
}

/// Messages sent from the event loop to the worker.
///
/// Every variant carries an optional trace context so the spans opened by the
/// worker are children of the event that caused them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Load one page through the shared cache.
    FetchList {
        key: QueryKey,
        /// Echoed back in [`WorkerResponse::ListLoaded`].
        request: RequestId,
        /// Skip the freshness check (background revalidation, manual refresh).
        force: bool,
        trace_context: Option<TraceContext>,
    },

    /// Answer with [`WorkerResponse::DebounceElapsed`] after `delay`.
    ///
    /// A new schedule cancels the previous timer.
    ScheduleDebounce {
        ticket: Ticket,
        delay: Duration,
        trace_context: Option<TraceContext>,
    },

    UpdateStatus {
        resource: ResourceKind,
        change: StatusChange,
        trace_context: Option<TraceContext>,
    },

    DeleteRecord {
        resource: ResourceKind,
        id: String,
        trace_context: Option<TraceContext>,
    },

    /// Mark every cached page of `resource` stale.
    Invalidate {
        resource: ResourceKind,
        trace_context: Option<TraceContext>,
    },

    /// Upload a local file for a form field and track it.
    UploadFile {
        field: String,
        path: PathBuf,
        trace_context: Option<TraceContext>,
    },

    /// The user removed a file from a form field.
    RemoveUpload {
        field: String,
        url: String,
        trace_context: Option<TraceContext>,
    },

    /// The form owning `field` was saved (`saved = true`) or abandoned.
    SettleUploads {
        field: String,
        saved: bool,
        trace_context: Option<TraceContext>,
    },

    /// Abandon whatever a previous session left pending and delete its uploads.
    ReconcileUploads { trace_context: Option<TraceContext> },
}

impl WorkerMessage {
    /// Trace context attached when the message was built.
    #[must_use]
    pub const fn trace_context(&self) -> Option<&TraceContext> {
        match self {
            Self::FetchList { trace_context, .. }
            | Self::ScheduleDebounce { trace_context, .. }
            | Self::UpdateStatus { trace_context, .. }
            | Self::DeleteRecord { trace_context, .. }
            | Self::Invalidate { trace_context, .. }
            | Self::UploadFile { trace_context, .. }
            | Self::RemoveUpload { trace_context, .. }
            | Self::SettleUploads { trace_context, .. }
            | Self::ReconcileUploads { trace_context } => trace_context.as_ref(),
        }
    }
}

/// Responses sent from the worker back to the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerResponse {
    /// A list request finished, successfully or not.
    ListLoaded {
        key: QueryKey,
        request: RequestId,
        result: Result<ListData, FetchError>,
    },

    /// The debounce delay of `ticket` elapsed.
    DebounceElapsed { ticket: Ticket },

    StatusUpdated { resource: ResourceKind, id: String },

    RecordDeleted { resource: ResourceKind, id: String },

    /// A status update or delete failed.
    MutationFailed {
        resource: ResourceKind,
        error: FetchError,
    },

    FileUploaded { field: String, url: String },

    /// Uploads of `field` were settled and the files that became garbage were
    /// deleted on the server. `failed` deletions stay tracked when they are
    /// orphaned uploads, so the next start retries them.
    UploadsSettled {
        field: String,
        saved: bool,
        removed: Vec<String>,
        failed: Vec<String>,
    },

    /// An error occurred in the worker outside a mutation.
    Error {
        /// Human-readable error message.
        message: String,
    },
}
