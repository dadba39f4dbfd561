//! Background worker for network calls, timers and upload bookkeeping.
//!
//! The event loop never awaits anything itself. It posts [`WorkerMessage`]s
//! here; the worker spawns one tokio task per message and reports completion
//! as a [`WorkerResponse`] on the response channel, which the event loop turns
//! back into events. Every spawned task is instrumented with a span whose
//! parent is the trace context carried by the message.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::app::debounce::Ticket;
use crate::domain::error::Result;
use crate::domain::{ResourceKind, StatusChange};
use crate::fetch::{FetchError, QueryClient, QueryKey, RequestId};
use crate::storage::UploadTracker;
use crate::worker::{WorkerMessage, WorkerResponse};

/// Worker state shared by every spawned task.
pub struct RentAdminWorker {
    client: QueryClient,
    uploads: Arc<Mutex<UploadTracker>>,
    responses: UnboundedSender<WorkerResponse>,
    /// Pending debounce timer, aborted when a new one is scheduled.
    debounce: Option<JoinHandle<()>>,
}

impl RentAdminWorker {
    #[must_use]
    pub fn new(client: QueryClient, uploads: UploadTracker, responses: UnboundedSender<WorkerResponse>) -> Self {
        Self {
            client,
            uploads: Arc::new(Mutex::new(uploads)),
            responses,
            debounce: None,
        }
    }

    #[must_use]
    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    /// Attaches the parent trace context from a message to the current thread.
    ///
    /// This function reconstructs the OpenTelemetry context from the trace
    /// information in the message, allowing spans created by the worker to be
    /// linked to the event that posted the message.
    ///
    /// Returns a context guard that must be held while the worker span is created.
    fn attach_parent_trace_context(message: &WorkerMessage) -> Option<opentelemetry::ContextGuard> {
        use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};

        let trace_context = message.trace_context()?;

        let trace_id = TraceId::from_hex(&trace_context.trace_id).ok()?;
        let span_id = SpanId::from_hex(&trace_context.parent_span_id).ok()?;

        let span_context = SpanContext::new(
            trace_id,
            span_id,
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );

        let otel_context = opentelemetry::Context::current().with_remote_span_context(span_context);

        Some(otel_context.attach())
    }

    /// Dispatches a message. Must be called from within a tokio runtime.
    pub fn handle_message(&mut self, message: WorkerMessage) {
        let span = {
            let _context_guard = Self::attach_parent_trace_context(&message);
            tracing::debug_span!("worker_handle_message", message_type = message_name(&message))
        };

        match message {
            WorkerMessage::FetchList { key, request, force, .. } => self.spawn_fetch(key, request, force, span),
            WorkerMessage::ScheduleDebounce { ticket, delay, .. } => self.schedule_debounce(ticket, delay, span),
            WorkerMessage::UpdateStatus { resource, change, .. } => self.spawn_update_status(resource, change, span),
            WorkerMessage::DeleteRecord { resource, id, .. } => self.spawn_delete(resource, id, span),
            WorkerMessage::Invalidate { resource, .. } => {
                let _guard = span.entered();
                self.client.invalidate(resource);
            }
            WorkerMessage::UploadFile { field, path, .. } => self.spawn_upload(field, path, span),
            WorkerMessage::RemoveUpload { field, url, .. } => self.remove_upload(field, &url, span),
            WorkerMessage::SettleUploads { field, saved, .. } => self.settle_uploads(field, saved, span),
            WorkerMessage::ReconcileUploads { .. } => self.reconcile_uploads(&span),
        }
    }

    fn send(&self, response: WorkerResponse) {
        reply(&self.responses, response);
    }

    fn spawn_fetch(&self, key: QueryKey, request: RequestId, force: bool, span: tracing::Span) {
        let client = self.client.clone();
        let responses = self.responses.clone();
        tokio::spawn(
            async move {
                let result = if force {
                    client.refetch(key.clone()).await
                } else {
                    client.fetch(key.clone()).await
                };
                if let Err(error) = &result {
                    tracing::warn!(key = %key, error = %error, "list request failed");
                }
                reply(&responses, WorkerResponse::ListLoaded { key, request, result });
            }
            .instrument(span),
        );
    }

    fn schedule_debounce(&mut self, ticket: Ticket, delay: Duration, span: tracing::Span) {
        if let Some(previous) = self.debounce.take() {
            previous.abort();
        }
        let responses = self.responses.clone();
        self.debounce = Some(tokio::spawn(
            async move {
                tokio::time::sleep(delay).await;
                tracing::trace!(ticket = ticket.id(), "debounce elapsed");
                reply(&responses, WorkerResponse::DebounceElapsed { ticket });
            }
            .instrument(span),
        ));
    }

    fn spawn_update_status(&self, resource: ResourceKind, change: StatusChange, span: tracing::Span) {
        let backend = self.client.backend();
        let responses = self.responses.clone();
        tokio::spawn(
            async move {
                let response = match backend.update_status(resource, &change).await {
                    Ok(()) => {
                        tracing::debug!(id = %change.id, status = %change.approval_status, "status updated");
                        WorkerResponse::StatusUpdated { resource, id: change.id }
                    }
                    Err(error) => mutation_failed(resource, error),
                };
                reply(&responses, response);
            }
            .instrument(span),
        );
    }

    fn spawn_delete(&self, resource: ResourceKind, id: String, span: tracing::Span) {
        let backend = self.client.backend();
        let responses = self.responses.clone();
        tokio::spawn(
            async move {
                let response = match backend.delete_record(resource, &id).await {
                    Ok(()) => {
                        tracing::debug!(id = %id, "record deleted");
                        WorkerResponse::RecordDeleted { resource, id }
                    }
                    Err(error) => mutation_failed(resource, error),
                };
                reply(&responses, response);
            }
            .instrument(span),
        );
    }

    fn spawn_upload(&self, field: String, path: PathBuf, span: tracing::Span) {
        let backend = self.client.backend();
        let uploads = Arc::clone(&self.uploads);
        let responses = self.responses.clone();
        tokio::spawn(
            async move {
                let response = match backend.upload_file(&field, &path).await {
                    Ok(uploaded) => {
                        let recorded = uploads
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .record_upload(&field, &uploaded.url);
                        match recorded {
                            Ok(()) => WorkerResponse::FileUploaded { field, url: uploaded.url },
                            Err(e) => storage_error("record upload", &e),
                        }
                    }
                    Err(error) => {
                        tracing::error!(field = %field, path = %path.display(), error = %error, "upload failed");
                        WorkerResponse::Error { message: error.message() }
                    }
                };
                reply(&responses, response);
            }
            .instrument(span),
        );
    }

    fn remove_upload(&self, field: String, url: &str, span: tracing::Span) {
        let removed = {
            let _guard = span.enter();
            self.uploads
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .mark_removed(&field, url)
        };
        match removed {
            Ok(orphan) => self.spawn_cleanup(field, false, orphan.into_iter().collect(), span),
            Err(e) => self.send(storage_error("remove upload", &e)),
        }
    }

    fn settle_uploads(&self, field: String, saved: bool, span: tracing::Span) {
        let settled: Result<Vec<String>> = {
            let _guard = span.enter();
            let mut uploads = self.uploads.lock().unwrap_or_else(PoisonError::into_inner);
            if saved {
                uploads.commit(&field)
            } else {
                uploads.abandon(&field)
            }
        };
        match settled {
            Ok(cleanup) => self.spawn_cleanup(field, saved, cleanup, span),
            Err(e) => self.send(storage_error("settle uploads", &e)),
        }
    }

    /// Abandons the fields an interrupted session left behind.
    fn reconcile_uploads(&self, span: &tracing::Span) {
        let leftovers: Result<Vec<(String, Vec<String>)>> = {
            let _guard = span.enter();
            let mut uploads = self.uploads.lock().unwrap_or_else(PoisonError::into_inner);
            uploads.pending_fields().and_then(|fields| {
                fields
                    .into_iter()
                    .map(|field| uploads.abandon(&field).map(|orphans| (field, orphans)))
                    .collect()
            })
        };
        match leftovers {
            Ok(leftovers) => {
                if !leftovers.is_empty() {
                    tracing::info!(fields = leftovers.len(), "cleaning up uploads of an earlier session");
                }
                for (field, orphans) in leftovers {
                    self.spawn_cleanup(field, false, orphans, span.clone());
                }
            }
            Err(e) => self.send(storage_error("reconcile uploads", &e)),
        }
    }

    /// Deletes `urls` on the server and reports the outcome.
    ///
    /// Orphaned uploads that could not be deleted are recorded again so a
    /// later reconcile picks them up.
    fn spawn_cleanup(&self, field: String, saved: bool, urls: Vec<String>, span: tracing::Span) {
        let backend = self.client.backend();
        let uploads = Arc::clone(&self.uploads);
        let responses = self.responses.clone();
        tokio::spawn(
            async move {
                let mut removed = Vec::new();
                let mut failed = Vec::new();
                for url in urls {
                    match backend.delete_file(&url).await {
                        Ok(()) => removed.push(url),
                        Err(error) => {
                            tracing::warn!(field = %field, url = %url, error = %error, "file delete failed");
                            failed.push(url);
                        }
                    }
                }

                if !saved && !failed.is_empty() {
                    let mut uploads = uploads.lock().unwrap_or_else(PoisonError::into_inner);
                    for url in &failed {
                        if let Err(e) = uploads.record_upload(&field, url) {
                            tracing::error!(field = %field, url = %url, error = %e, "failed to keep orphan for retry");
                        }
                    }
                }

                tracing::debug!(
                    field = %field,
                    saved = saved,
                    removed = removed.len(),
                    failed = failed.len(),
                    "uploads settled"
                );
                reply(&responses, WorkerResponse::UploadsSettled { field, saved, removed, failed });
            }
            .instrument(span),
        );
    }
}

impl Drop for RentAdminWorker {
    fn drop(&mut self) {
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
    }
}

fn reply(responses: &UnboundedSender<WorkerResponse>, response: WorkerResponse) {
    if responses.send(response).is_err() {
        tracing::debug!("event loop is gone, dropping worker response");
    }
}

fn mutation_failed(resource: ResourceKind, error: FetchError) -> WorkerResponse {
    tracing::error!(resource = %resource, error = %error, "mutation failed");
    WorkerResponse::MutationFailed { resource, error }
}

fn storage_error(operation: &str, error: &crate::RentAdminError) -> WorkerResponse {
    tracing::error!(operation = operation, error = %error, "storage operation failed");
    WorkerResponse::Error {
        message: format!("{operation}: {error}"),
    }
}

const fn message_name(message: &WorkerMessage) -> &'static str {
    match message {
        WorkerMessage::FetchList { .. } => "fetch_list",
        WorkerMessage::ScheduleDebounce { .. } => "schedule_debounce",
        WorkerMessage::UpdateStatus { .. } => "update_status",
        WorkerMessage::DeleteRecord { .. } => "delete_record",
        WorkerMessage::Invalidate { .. } => "invalidate",
        WorkerMessage::UploadFile { .. } => "upload_file",
        WorkerMessage::RemoveUpload { .. } => "remove_upload",
        WorkerMessage::SettleUploads { .. } => "settle_uploads",
        WorkerMessage::ReconcileUploads { .. } => "reconcile_uploads",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApprovalStatus, ListingQuery};
    use crate::fetch::{FixtureBackend, FixtureCall, RetryPolicy};
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn worker(backend: Arc<FixtureBackend>) -> (RentAdminWorker, mpsc::UnboundedReceiver<WorkerResponse>) {
        let client = QueryClient::new(backend, Duration::from_secs(30), RetryPolicy::none());
        let (tx, rx) = mpsc::unbounded_channel();
        let uploads = UploadTracker::new(Box::new(MemoryStorage::new()));
        (RentAdminWorker::new(client, uploads, tx), rx)
    }

    fn vehicles() -> Vec<serde_json::Value> {
        vec![json!({"id": "v-1", "modelName": "Corolla", "approvalStatus": "PENDING"})]
    }

    #[tokio::test]
    async fn fetch_reports_the_loaded_page() {
        let backend = Arc::new(FixtureBackend::new().with_records(ResourceKind::Vehicles, vehicles()));
        let (mut worker, mut rx) = worker(Arc::clone(&backend));
        let key = QueryKey::new(ResourceKind::Vehicles, &ListingQuery::default());

        let request = RequestId::default();
        worker.handle_message(WorkerMessage::fetch_list(key.clone(), request, false));

        match rx.recv().await {
            Some(WorkerResponse::ListLoaded {
                key: loaded,
                request: echoed,
                result: Ok(data),
            }) => {
                assert_eq!(loaded, key);
                assert_eq!(echoed, request);
                assert_eq!(data.total, 1);
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn a_new_debounce_cancels_the_previous_timer() {
        let backend = Arc::new(FixtureBackend::new());
        let (mut worker, mut rx) = worker(backend);
        let mut debouncer = crate::app::debounce::Debouncer::new(Duration::from_millis(500));

        let first = debouncer.push("t");
        worker.handle_message(WorkerMessage::schedule_debounce(first, Duration::from_millis(500)));
        tokio::time::sleep(Duration::from_millis(200)).await;
        let second = debouncer.push("to");
        worker.handle_message(WorkerMessage::schedule_debounce(second, Duration::from_millis(500)));

        match rx.recv().await {
            Some(WorkerResponse::DebounceElapsed { ticket }) => assert_eq!(ticket, second),
            other => panic!("unexpected response {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn status_updates_reach_the_backend() {
        let backend = Arc::new(FixtureBackend::new().with_records(ResourceKind::Vehicles, vehicles()));
        let (mut worker, mut rx) = worker(Arc::clone(&backend));
        let change = StatusChange::new("v-1", ApprovalStatus::Approved, None);

        worker.handle_message(WorkerMessage::update_status(ResourceKind::Vehicles, change.clone()));

        assert_eq!(
            rx.recv().await,
            Some(WorkerResponse::StatusUpdated {
                resource: ResourceKind::Vehicles,
                id: "v-1".to_string()
            })
        );
        assert!(backend.calls().contains(&FixtureCall::UpdateStatus {
            resource: ResourceKind::Vehicles,
            change
        }));
    }

    #[tokio::test]
    async fn deleting_a_missing_record_fails_the_mutation() {
        let backend = Arc::new(FixtureBackend::new());
        let (mut worker, mut rx) = worker(backend);

        worker.handle_message(WorkerMessage::delete_record(ResourceKind::Brands, "b-9".to_string()));

        assert!(matches!(
            rx.recv().await,
            Some(WorkerResponse::MutationFailed { error: FetchError::NotFound(_), .. })
        ));
    }

    #[tokio::test]
    async fn abandoned_uploads_are_deleted_on_the_server() {
        let backend = Arc::new(FixtureBackend::new());
        let (mut worker, mut rx) = worker(Arc::clone(&backend));

        worker.handle_message(WorkerMessage::upload_file("logo".to_string(), PathBuf::from("/tmp/kia.png")));
        let url = match rx.recv().await {
            Some(WorkerResponse::FileUploaded { url, .. }) => url,
            other => panic!("unexpected response {other:?}"),
        };

        worker.handle_message(WorkerMessage::settle_uploads("logo".to_string(), false));
        assert_eq!(
            rx.recv().await,
            Some(WorkerResponse::UploadsSettled {
                field: "logo".to_string(),
                saved: false,
                removed: vec![url.clone()],
                failed: vec![],
            })
        );
        assert_eq!(backend.deleted_files(), vec![url]);
    }

    #[tokio::test]
    async fn saving_deletes_the_files_the_user_removed() {
        let backend = Arc::new(FixtureBackend::new());
        let (mut worker, mut rx) = worker(Arc::clone(&backend));

        worker.handle_message(WorkerMessage::remove_upload("logo".to_string(), "https://cdn/old.png".to_string()));
        assert!(matches!(
            rx.recv().await,
            Some(WorkerResponse::UploadsSettled { ref removed, .. }) if removed.is_empty()
        ));
        assert!(backend.deleted_files().is_empty());

        worker.handle_message(WorkerMessage::settle_uploads("logo".to_string(), true));
        assert!(matches!(
            rx.recv().await,
            Some(WorkerResponse::UploadsSettled { saved: true, ref removed, .. }) if removed == &["https://cdn/old.png"]
        ));
        assert_eq!(backend.deleted_files(), vec!["https://cdn/old.png"]);
    }

    #[tokio::test]
    async fn leftovers_of_an_earlier_session_are_cleaned_up() {
        let backend = Arc::new(FixtureBackend::new());
        let client = QueryClient::new(backend.clone(), Duration::from_secs(30), RetryPolicy::none());
        let mut uploads = UploadTracker::new(Box::new(MemoryStorage::new()));
        uploads.record_upload("gallery", "https://cdn/g1.png").unwrap();
        uploads.record_upload("gallery", "https://cdn/g2.png").unwrap();
        uploads.mark_removed("gallery", "https://cdn/kept.png").unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut worker = RentAdminWorker::new(client, uploads, tx);

        worker.handle_message(WorkerMessage::reconcile_uploads());

        assert!(matches!(
            rx.recv().await,
            Some(WorkerResponse::UploadsSettled { saved: false, ref removed, .. }) if removed.len() == 2
        ));
        assert_eq!(backend.deleted_files(), vec!["https://cdn/g1.png", "https://cdn/g2.png"]);
        assert!(worker.uploads.lock().unwrap().pending_fields().unwrap().is_empty());
    }

    #[tokio::test]
    async fn orphans_that_fail_to_delete_stay_tracked() {
        let backend = Arc::new(FixtureBackend::new());
        let (mut worker, mut rx) = worker(Arc::clone(&backend));
        worker
            .uploads
            .lock()
            .unwrap()
            .record_upload("logo", "https://cdn/a.png")
            .unwrap();
        backend.fail_next(FetchError::Timeout);

        worker.handle_message(WorkerMessage::settle_uploads("logo".to_string(), false));

        assert!(matches!(
            rx.recv().await,
            Some(WorkerResponse::UploadsSettled { ref failed, .. }) if failed == &["https://cdn/a.png"]
        ));
        let record = worker.uploads.lock().unwrap().record("logo").unwrap();
        assert_eq!(record.add, vec!["https://cdn/a.png"]);
    }
}
