//! End-to-end listing flows: events through the handler, messages through the
//! worker, responses back into the state. Time is paused so debounce delays
//! are exact.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use rentadmin::app::location::Location;
use rentadmin::app::{RowAction, ToastKind};
use rentadmin::domain::{ApprovalStatus, PageLimit, ResourceKind};
use rentadmin::fetch::{FetchError, FixtureBackend, FixtureCall, QueryClient, QueryKey, RequestId, RetryPolicy};
use rentadmin::storage::{MemoryStorage, RegionRef, Selection, UploadTracker};
use rentadmin::ui::{TableBody, Theme};
use rentadmin::worker::{RentAdminWorker, WorkerMessage, WorkerResponse};
use rentadmin::{handle_event, Action, Event, ListingOptions, ListingState};

struct Harness {
    state: ListingState,
    worker: RentAdminWorker,
    responses: UnboundedReceiver<WorkerResponse>,
    backend: Arc<FixtureBackend>,
    /// Every list request posted to the worker, in order.
    fetches: Vec<(QueryKey, RequestId)>,
    urls: Vec<String>,
    navigations: Vec<String>,
}

impl Harness {
    fn new(resource: ResourceKind, url: &str, backend: FixtureBackend, options: ListingOptions) -> Self {
        let backend = Arc::new(backend);
        let client = QueryClient::new(backend.clone(), Duration::from_secs(30), RetryPolicy::none());
        Self::with_client(resource, url, backend, client, options, &Selection::default())
    }

    fn with_client(
        resource: ResourceKind,
        url: &str,
        backend: Arc<FixtureBackend>,
        client: QueryClient,
        options: ListingOptions,
        selection: &Selection,
    ) -> Self {
        let (tx, responses) = mpsc::unbounded_channel();
        let worker = RentAdminWorker::new(client.clone(), UploadTracker::new(Box::new(MemoryStorage::new())), tx);
        let state = ListingState::new(
            resource,
            Location::parse(url).unwrap(),
            selection,
            client,
            options,
            Theme::default(),
        );
        Self {
            state,
            worker,
            responses,
            backend,
            fetches: vec![],
            urls: vec![],
            navigations: vec![],
        }
    }

    fn send(&mut self, event: Event) -> bool {
        let (render, actions) = handle_event(&mut self.state, &event).unwrap();
        for action in actions {
            match action {
                Action::PostToWorker(message) => {
                    if let WorkerMessage::FetchList { key, request, .. } = &message {
                        self.fetches.push((key.clone(), *request));
                    }
                    self.worker.handle_message(message);
                }
                Action::ReplaceUrl(url) => self.urls.push(url),
                Action::Navigate(url) => self.navigations.push(url),
                Action::Quit => {}
            }
        }
        render
    }

    /// Lets spawned tasks finish and feeds their responses back in.
    async fn settle(&mut self) {
        loop {
            tokio::time::sleep(Duration::from_millis(1)).await;
            let mut received = false;
            while let Ok(response) = self.responses.try_recv() {
                received = true;
                self.send(Event::WorkerResponse(response));
            }
            if !received {
                break;
            }
        }
    }

    async fn advance(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
        self.settle().await;
    }

    fn list_calls(&self) -> Vec<QueryKey> {
        self.backend.list_calls()
    }

    fn body(&self) -> TableBody {
        self.state.compute_viewmodel().body
    }

    fn last_toast(&self) -> Option<(ToastKind, String)> {
        self.state.toasts().last().map(|toast| (toast.kind, toast.message.clone()))
    }
}

fn brands(total: usize) -> FixtureBackend {
    let rows = (1..=total)
        .map(|i| {
            let name = if i % 16 == 5 { format!("Toyota {i}") } else { format!("Brand {i}") };
            json!({"id": format!("b-{i:02}"), "brandName": name, "vehicleCategory": "car"})
        })
        .collect();
    FixtureBackend::new().with_records(ResourceKind::Brands, rows)
}

fn vehicle(id: &str, model: &str, status: &str, modified: bool) -> Value {
    json!({"id": id, "modelName": model, "approvalStatus": status, "isModified": modified})
}

fn vehicles() -> FixtureBackend {
    FixtureBackend::new().with_records(
        ResourceKind::Vehicles,
        vec![
            vehicle("v-1", "Corolla", "PENDING", false),
            vehicle("v-2", "Swift", "APPROVED", true),
            vehicle("v-3", "Creta", "REJECTED", false),
        ],
    )
}

fn twenty_per_page() -> ListingOptions {
    ListingOptions {
        limit: PageLimit::Twenty,
        ..ListingOptions::default()
    }
}

fn row_count(body: &TableBody) -> usize {
    match body {
        TableBody::Rows(rows) => rows.len(),
        _ => 0,
    }
}

#[tokio::test(start_paused = true)]
async fn paging_then_searching_fetches_once_after_the_quiet_period() {
    let mut h = Harness::new(ResourceKind::Brands, "/brands", brands(47), twenty_per_page());
    h.send(Event::Mount);
    h.settle().await;

    let vm = h.state.compute_viewmodel();
    let pagination = vm.pagination.unwrap();
    assert_eq!(pagination.total_pages, 3);
    assert!(!pagination.prev_enabled);
    assert!(pagination.next_enabled);

    h.send(Event::SetPage(3));
    h.settle().await;
    assert_eq!(h.list_calls().last().unwrap().page(), 3);
    let vm = h.state.compute_viewmodel();
    let pagination = vm.pagination.unwrap();
    assert_eq!(pagination.current, 3);
    assert!(pagination.prev_enabled);
    assert!(!pagination.next_enabled);
    assert_eq!(row_count(&vm.body), 7);

    let calls_before = h.list_calls().len();
    h.send(Event::SetSearchInput("toyota".to_string()));
    h.advance(Duration::from_millis(450)).await;
    assert_eq!(h.list_calls().len(), calls_before);
    assert_eq!(h.state.location().param("search"), None);

    h.advance(Duration::from_millis(100)).await;
    let calls = h.list_calls();
    assert_eq!(calls.len(), calls_before + 1);
    let key = calls.last().unwrap();
    assert_eq!(key.page(), 1);
    assert_eq!(key.param("search"), Some("toyota"));
    assert_eq!(h.urls.last().map(String::as_str), Some("/brands?search=toyota"));

    let vm = h.state.compute_viewmodel();
    assert_eq!(row_count(&vm.body), 3);
    assert!(vm.pagination.is_none());
}

#[tokio::test(start_paused = true)]
async fn only_the_last_keystroke_of_a_burst_is_committed() {
    let mut h = Harness::new(ResourceKind::Brands, "/brands", brands(47), twenty_per_page());
    h.send(Event::Mount);
    h.settle().await;
    let calls_before = h.list_calls().len();

    for text in ["t", "to", "toy", "toyo"] {
        h.send(Event::SetSearchInput(text.to_string()));
        h.advance(Duration::from_millis(200)).await;
    }
    h.advance(Duration::from_millis(400)).await;

    let calls = h.list_calls();
    assert_eq!(calls.len(), calls_before + 1);
    assert_eq!(calls.last().unwrap().param("search"), Some("toyo"));
    assert_eq!(h.urls, vec!["/brands?search=toyo".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn clearing_the_search_removes_the_url_parameter() {
    let mut h = Harness::new(ResourceKind::Brands, "/brands?search=toyota", brands(47), twenty_per_page());
    h.send(Event::Mount);
    h.settle().await;
    assert_eq!(h.state.search_input, "toyota");
    assert_eq!(h.list_calls()[0].param("search"), Some("toyota"));

    h.send(Event::SetSearchInput("   ".to_string()));
    h.advance(Duration::from_millis(600)).await;

    assert_eq!(h.state.location().param("search"), None);
    assert_eq!(h.urls.last().map(String::as_str), Some("/brands"));
    assert_eq!(h.list_calls().last().unwrap().param("search"), None);
}

#[tokio::test(start_paused = true)]
async fn responses_for_abandoned_keys_are_ignored() {
    let mut h = Harness::new(ResourceKind::Brands, "/brands", brands(47), twenty_per_page());
    h.send(Event::Mount);
    h.settle().await;
    let (first_key, first_request) = h.fetches[0].clone();
    let first_page = h.state.status().data.unwrap();

    h.send(Event::SetPage(2));
    h.settle().await;
    let second_page = h.state.status().data.unwrap();
    assert_ne!(first_page, second_page);

    let render = h.send(Event::WorkerResponse(WorkerResponse::ListLoaded {
        key: first_key,
        request: first_request,
        result: Ok(first_page),
    }));
    assert!(!render);
    assert_eq!(h.state.status().data.unwrap(), second_page);
}

#[tokio::test(start_paused = true)]
async fn a_late_refetch_cannot_bring_back_a_deleted_row() {
    let mut h = Harness::new(ResourceKind::Vehicles, "/vehicles?tab=all", vehicles(), ListingOptions::default());
    h.send(Event::Mount);
    h.settle().await;

    h.send(Event::Refresh);
    let (refresh_key, refresh_request) = h.fetches.last().cloned().unwrap();
    h.settle().await;
    let before_delete = h.state.status().data.unwrap();
    assert_eq!(before_delete.total, 3);

    h.send(Event::RowAction { number: 1, action: RowAction::Delete });
    h.send(Event::ConfirmDelete);
    h.settle().await;
    let (revalidate_key, revalidate_request) = h.fetches.last().cloned().unwrap();
    assert_eq!(revalidate_key, refresh_key);
    assert!(revalidate_request > refresh_request);
    assert_eq!(row_count(&h.body()), 2);

    let render = h.send(Event::WorkerResponse(WorkerResponse::ListLoaded {
        key: refresh_key,
        request: refresh_request,
        result: Ok(before_delete),
    }));
    assert!(!render);
    assert_eq!(row_count(&h.body()), 2);
    assert_eq!(h.state.status().data.map(|data| data.total), Some(2));
}

#[tokio::test(start_paused = true)]
async fn loading_then_empty_never_overlap() {
    let backend = FixtureBackend::new().with_latency(Duration::from_millis(50));
    let mut h = Harness::new(ResourceKind::Coupons, "/coupons", backend, ListingOptions::default());
    h.send(Event::Mount);

    let body = h.body();
    assert!(body.is_loading());
    assert!(!body.is_empty_state());

    h.advance(Duration::from_millis(60)).await;
    let body = h.body();
    assert!(!body.is_loading());
    match body {
        TableBody::Empty(empty) => assert_eq!(empty.message, "No coupons found"),
        other => panic!("expected the empty state, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn screens_sharing_a_cache_coalesce_identical_requests() {
    let backend = Arc::new(brands(12).with_latency(Duration::from_millis(50)));
    let client = QueryClient::new(backend.clone(), Duration::from_secs(30), RetryPolicy::none());
    let selection = Selection::default();
    let mut first = Harness::with_client(
        ResourceKind::Brands,
        "/brands",
        backend.clone(),
        client.clone(),
        ListingOptions::default(),
        &selection,
    );
    let mut second = Harness::with_client(
        ResourceKind::Brands,
        "/brands",
        backend.clone(),
        client,
        ListingOptions::default(),
        &selection,
    );

    first.send(Event::Mount);
    second.send(Event::Mount);
    first.advance(Duration::from_millis(60)).await;
    second.settle().await;

    assert_eq!(backend.list_calls().len(), 1);
    assert_eq!(row_count(&first.body()), 10);
    assert_eq!(row_count(&second.body()), 10);
}

#[tokio::test(start_paused = true)]
async fn invalid_tabs_redirect_and_tabs_filter_by_status() {
    let mut h = Harness::new(ResourceKind::Vehicles, "/vehicles?tab=archived", vehicles(), ListingOptions::default());
    h.send(Event::Mount);
    h.settle().await;

    assert_eq!(h.state.location().param("tab").as_deref(), Some("all"));
    assert!(h.urls[0].contains("tab=all"));
    assert_eq!(row_count(&h.body()), 3);

    h.send(Event::SwitchTab("pending".to_string()));
    h.settle().await;
    assert_eq!(h.list_calls().last().unwrap().param("approvalStatus"), Some("PENDING"));
    assert_eq!(row_count(&h.body()), 1);
    assert!(handle_event(&mut h.state, &Event::SwitchTab("archived".to_string())).is_err());
}

#[tokio::test(start_paused = true)]
async fn approving_a_vehicle_revalidates_the_list() {
    let mut h = Harness::new(ResourceKind::Vehicles, "/vehicles?tab=all", vehicles(), ListingOptions::default());
    h.send(Event::Mount);
    h.settle().await;

    // Descending order: v-3, v-2, v-1.
    h.send(Event::RowAction { number: 3, action: RowAction::ChangeStatus });
    assert!(h.state.compute_viewmodel().modal.is_some());
    h.send(Event::SubmitStatus { status: "approved".to_string(), reason: None });
    h.settle().await;

    assert!(h.backend.calls().iter().any(|call| matches!(
        call,
        FixtureCall::UpdateStatus { change, .. }
            if change.id == "v-1" && change.approval_status == ApprovalStatus::Approved
    )));
    assert_eq!(h.last_toast(), Some((ToastKind::Success, "Status updated".to_string())));
    assert!(h.state.compute_viewmodel().modal.is_none());
    assert_eq!(h.state.row(3).unwrap().approval_status(), Some(ApprovalStatus::Approved));
}

#[tokio::test(start_paused = true)]
async fn rejecting_without_a_reason_never_reaches_the_server() {
    let mut h = Harness::new(ResourceKind::Vehicles, "/vehicles?tab=all", vehicles(), ListingOptions::default());
    h.send(Event::Mount);
    h.settle().await;

    h.send(Event::RowAction { number: 3, action: RowAction::ChangeStatus });
    h.send(Event::SubmitStatus { status: "rejected".to_string(), reason: Some("  ".to_string()) });
    h.settle().await;

    assert!(!h.backend.calls().iter().any(|call| matches!(call, FixtureCall::UpdateStatus { .. })));
    assert_eq!(h.last_toast().map(|(kind, _)| kind), Some(ToastKind::Destructive));

    h.send(Event::SubmitStatus { status: "rejected".to_string(), reason: Some("Blurry photos".to_string()) });
    h.settle().await;
    assert_eq!(h.state.row(3).unwrap().approval_status(), Some(ApprovalStatus::Rejected));
}

#[tokio::test(start_paused = true)]
async fn server_failures_show_a_generic_toast() {
    let mut h = Harness::new(ResourceKind::Vehicles, "/vehicles?tab=all", vehicles(), ListingOptions::default());
    h.send(Event::Mount);
    h.settle().await;

    h.send(Event::RowAction { number: 1, action: RowAction::Delete });
    h.backend.fail_next(FetchError::Http { status: 500, body: "boom".to_string() });
    h.send(Event::ConfirmDelete);
    h.settle().await;

    assert_eq!(h.last_toast(), Some((ToastKind::Destructive, "Something went wrong".to_string())));
    assert!(h.state.modal.is_open());

    h.send(Event::ConfirmDelete);
    h.settle().await;
    assert_eq!(h.last_toast().map(|(kind, _)| kind), Some(ToastKind::Success));
    assert_eq!(row_count(&h.body()), 2);
}

#[tokio::test(start_paused = true)]
async fn edit_navigates_to_the_form() {
    let mut h = Harness::new(ResourceKind::Vehicles, "/vehicles", vehicles(), ListingOptions::default());
    h.send(Event::Mount);
    h.settle().await;

    h.send(Event::RowAction { number: 1, action: RowAction::Edit });
    assert_eq!(h.navigations, vec!["/vehicles/edit/v-3".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn locations_wait_for_a_state_selection() {
    let backend = FixtureBackend::new().with_records(
        ResourceKind::Locations,
        vec![
            json!({"id": "l-1", "name": "Panaji", "stateId": "st-4"}),
            json!({"id": "l-2", "name": "Chennai", "stateId": "st-9"}),
        ],
    );
    let mut h = Harness::new(ResourceKind::Locations, "/locations", backend, ListingOptions::default());
    h.send(Event::Mount);
    h.settle().await;

    assert!(h.list_calls().is_empty());
    match h.body() {
        TableBody::Empty(empty) => assert_eq!(empty.message, "Select a state to see locations"),
        other => panic!("expected the disabled state, got {other:?}"),
    }

    let selection = Selection {
        selected_state: Some(RegionRef::new("st-4", "Goa")),
        ..Selection::default()
    };
    h.send(Event::SelectionChanged(selection));
    h.settle().await;

    assert_eq!(h.list_calls()[0].param("stateId"), Some("st-4"));
    assert_eq!(row_count(&h.body()), 1);

    h.send(Event::SelectionChanged(Selection::default()));
    h.settle().await;

    assert_eq!(h.list_calls().len(), 1);
    assert_eq!(h.state.missing_prerequisites(), vec!["stateId"]);
    match h.body() {
        TableBody::Empty(empty) => assert_eq!(empty.message, "Select a state to see locations"),
        other => panic!("expected the disabled state, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn abandoned_uploads_are_deleted() {
    let mut h = Harness::new(ResourceKind::Brands, "/brands", brands(3), ListingOptions::default());
    h.send(Event::UploadFile { field: "brandLogo".to_string(), path: "/tmp/logo.png".into() });
    h.settle().await;
    assert_eq!(
        h.last_toast().map(|(_, message)| message),
        Some("Uploaded fixture://uploads/brandLogo/logo.png".to_string())
    );

    h.send(Event::SettleUploads { field: "brandLogo".to_string(), saved: false });
    h.settle().await;
    assert_eq!(
        h.last_toast(),
        Some((ToastKind::Success, "Removed 1 file(s) of brandLogo".to_string()))
    );
    assert_eq!(h.backend.deleted_files(), vec!["fixture://uploads/brandLogo/logo.png"]);
}
