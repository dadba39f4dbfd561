//! Event handling and state transition logic.
//!
//! This module implements the event handler that processes user input, region
//! selection changes and worker responses, translating them into state changes
//! and action sequences.
//!
//! # Architecture
//!
//! 1. Events arrive from the console or the worker
//! 2. [`handle_event`] pattern-matches the event type
//! 3. State mutations occur via `ListingState` methods
//! 4. Actions are collected and returned for execution
//!
//! # Event Types
//!
//! - **Query**: `SetPage`, `NextPage`, `PreviousPage`, `SetLimit`, `SetSortOrder`, `SetFilter`, `SwitchTab`
//! - **Search**: `SearchMode`, `Char`, `Backspace`, `SetSearchInput`, `ExitSearch`, `ClearSearch`
//! - **Rows**: `RowAction`, `SubmitStatus`, `ConfirmDelete`, `CloseModal`
//! - **Uploads**: `UploadFile`, `RemoveUpload`, `SettleUploads`
//! - **System**: `Mount`, `Refresh`, `SelectionChanged`, `WorkerResponse`

use std::path::PathBuf;

use crate::app::modes::{InputMode, ModalState, RowAction, Toast};
use crate::app::options::filter_options;
use crate::app::{Action, ListingState};
use crate::domain::error::{RentAdminError, Result};
use crate::domain::{validate_transition, ApprovalStatus, PageLimit, ReviewFlow, SortOrder, StatusChange};
use crate::storage::Selection;
use crate::worker::{WorkerMessage, WorkerResponse};

/// Message shown for every failed network mutation.
const GENERIC_FAILURE: &str = "Something went wrong";

/// Events triggered by user input, selection changes, or worker responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Resolves the tab and starts the first fetch.
    Mount,

    SetPage(u32),
    NextPage,
    PreviousPage,
    SetLimit(PageLimit),
    SetSortOrder(SortOrder),
    ToggleSortOrder,

    /// Sets (`Some`) or removes (`None`) a filter.
    SetFilter { key: String, value: Option<String> },

    SwitchTab(String),

    /// Focuses the search input.
    SearchMode,
    /// Leaves the search input; a pending commit still happens.
    ExitSearch,
    /// Appends a character to the search input.
    Char(char),
    /// Removes the last character from the search input.
    Backspace,
    /// Replaces the whole search input.
    SetSearchInput(String),
    /// Empties the search input and the committed term at once.
    ClearSearch,

    /// A row action on the one-based row `number` of the current page.
    RowAction { number: usize, action: RowAction },

    /// Submits the open status dialog. `status` may be a partial label.
    SubmitStatus { status: String, reason: Option<String> },

    /// Confirms the open delete dialog.
    ConfirmDelete,

    CloseModal,

    /// Refetches the current page regardless of freshness.
    Refresh,

    /// The region selection changed elsewhere in the dashboard.
    SelectionChanged(Selection),

    UploadFile { field: String, path: PathBuf },
    RemoveUpload { field: String, url: String },
    /// The form owning `field` was saved or abandoned.
    SettleUploads { field: String, saved: bool },

    Quit,

    /// Wraps a response from the background worker.
    WorkerResponse(WorkerResponse),
}

/// Processes an event, mutates listing state, and returns actions to execute.
///
/// The returned flag tells the runtime whether the screen must be redrawn.
///
/// # Errors
///
/// Returns validation errors for commands that target something that does not
/// exist (an unknown tab, a row that is not on the page, a dialog that is not
/// open). Network and business-rule failures are reported as toasts instead.
///
/// # Tracing
///
/// Each call creates a debug-level span with the event type.
#[allow(clippy::too_many_lines)]
pub fn handle_event(state: &mut ListingState, event: &Event) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_event", event_type = ?event, resource = %state.resource()).entered();

    match event {
        Event::Mount => {
            let mut actions = vec![];
            if let Some(url) = state.mount() {
                actions.push(Action::ReplaceUrl(url));
            }
            actions.extend(fetch_actions(state, false));
            Ok((true, actions))
        }
        Event::SetPage(page) => {
            let changed = state.set_page(*page);
            Ok(refetch_if(state, changed))
        }
        Event::NextPage => {
            let changed = state.next_page();
            Ok(refetch_if(state, changed))
        }
        Event::PreviousPage => {
            let changed = state.previous_page();
            Ok(refetch_if(state, changed))
        }
        Event::SetLimit(limit) => {
            let changed = state.set_limit(*limit);
            Ok(refetch_if(state, changed))
        }
        Event::SetSortOrder(order) => {
            let changed = state.set_sort_order(*order);
            Ok(refetch_if(state, changed))
        }
        Event::ToggleSortOrder => {
            let order = state.query.sort_order.toggled();
            let changed = state.set_sort_order(order);
            Ok(refetch_if(state, changed))
        }
        Event::SetFilter { key, value } => {
            let changed = state.set_filter(key, value.clone());
            Ok(refetch_if(state, changed))
        }
        Event::SwitchTab(name) => {
            let changed = state.switch_tab(name)?;
            let mut actions = vec![Action::ReplaceUrl(state.location().path_and_query())];
            if changed {
                actions.extend(fetch_actions(state, false));
            }
            Ok((true, actions))
        }
        Event::SearchMode => {
            tracing::debug!("entering search mode");
            state.input_mode = InputMode::Search;
            Ok((true, vec![]))
        }
        Event::ExitSearch => {
            tracing::debug!(input = %state.search_input, "exiting search mode");
            state.input_mode = InputMode::Normal;
            Ok((true, vec![]))
        }
        Event::Char(c) => {
            if state.input_mode != InputMode::Search {
                return Ok((false, vec![]));
            }
            let mut input = state.search_input.clone();
            input.push(*c);
            tracing::trace!(input = %input, char = %c, "search input updated");
            Ok((true, schedule_search(state, input)))
        }
        Event::Backspace => {
            if state.input_mode != InputMode::Search {
                return Ok((false, vec![]));
            }
            let mut input = state.search_input.clone();
            if input.pop().is_none() {
                return Ok((false, vec![]));
            }
            Ok((true, schedule_search(state, input)))
        }
        Event::SetSearchInput(text) => Ok((true, schedule_search(state, text.clone()))),
        Event::ClearSearch => {
            state.input_mode = InputMode::Normal;
            let changed = state.clear_search();
            let mut actions = vec![Action::ReplaceUrl(state.location().path_and_query())];
            if changed {
                actions.extend(fetch_actions(state, false));
            }
            Ok((true, actions))
        }
        Event::RowAction { number, action } => handle_row_action(state, *number, *action),
        Event::SubmitStatus { status, reason } => handle_submit_status(state, status, reason.clone()),
        Event::ConfirmDelete => {
            if state.modal != ModalState::ConfirmDelete {
                return Err(RentAdminError::validation("confirm", "no delete is waiting for confirmation"));
            }
            let Some(record) = state.selected.clone() else {
                return Err(RentAdminError::validation("confirm", "no record selected"));
            };
            if !state.begin_mutation() {
                return Ok((false, vec![]));
            }
            tracing::debug!(id = %record.id(), "deleting record");
            Ok((
                true,
                vec![Action::PostToWorker(WorkerMessage::delete_record(
                    state.resource(),
                    record.id().to_string(),
                ))],
            ))
        }
        Event::CloseModal => {
            if !state.modal.is_open() {
                return Ok((false, vec![]));
            }
            state.close_modal();
            Ok((true, vec![]))
        }
        Event::Refresh => Ok((true, fetch_actions(state, true))),
        Event::SelectionChanged(selection) => {
            let changed = state.apply_selection(selection);
            tracing::debug!(changed = changed, "region selection changed");
            Ok(refetch_if(state, changed))
        }
        Event::UploadFile { field, path } => Ok((
            false,
            vec![Action::PostToWorker(WorkerMessage::upload_file(field.clone(), path.clone()))],
        )),
        Event::RemoveUpload { field, url } => Ok((
            false,
            vec![Action::PostToWorker(WorkerMessage::remove_upload(field.clone(), url.clone()))],
        )),
        Event::SettleUploads { field, saved } => Ok((
            false,
            vec![Action::PostToWorker(WorkerMessage::settle_uploads(field.clone(), *saved))],
        )),
        Event::Quit => Ok((false, vec![Action::Quit])),
        Event::WorkerResponse(response) => handle_worker_response(state, response),
    }
}

/// Starts a fetch of the current key, if the screen is enabled.
fn fetch_actions(state: &mut ListingState, force: bool) -> Vec<Action> {
    state
        .begin_fetch()
        .map(|(key, request)| Action::PostToWorker(WorkerMessage::fetch_list(key, request, force)))
        .into_iter()
        .collect()
}

fn refetch_if(state: &mut ListingState, changed: bool) -> (bool, Vec<Action>) {
    if changed {
        (true, fetch_actions(state, false))
    } else {
        (false, vec![])
    }
}

fn schedule_search(state: &mut ListingState, input: String) -> Vec<Action> {
    let ticket = state.set_search_input(input);
    vec![Action::PostToWorker(WorkerMessage::schedule_debounce(
        ticket,
        state.debounce_delay(),
    ))]
}

fn handle_row_action(state: &mut ListingState, number: usize, action: RowAction) -> Result<(bool, Vec<Action>)> {
    let record = state.row(number)?;
    tracing::debug!(id = %record.id(), action = ?action, "row action");

    match action {
        RowAction::Edit => Ok((
            false,
            vec![Action::Navigate(format!("/{}/edit/{}", state.resource().slug(), record.id()))],
        )),
        RowAction::Delete => {
            state.selected = Some(record);
            state.modal = ModalState::ConfirmDelete;
            Ok((true, vec![]))
        }
        RowAction::ChangeStatus => {
            let Some(current) = record.approval_status() else {
                return Err(RentAdminError::validation(
                    "status",
                    format!("{} have no approval status", state.resource().noun()),
                ));
            };
            state.modal = ModalState::StatusChange {
                current,
                flow: record.review_flow(),
                error: None,
            };
            state.selected = Some(record);
            Ok((true, vec![]))
        }
    }
}

/// Resolves what the user typed in the status dialog.
///
/// An exact status name wins; otherwise the input filters the offered
/// options and must leave exactly one.
fn resolve_status(input: &str, flow: ReviewFlow) -> std::result::Result<ApprovalStatus, String> {
    if let Ok(status) = input.parse::<ApprovalStatus>() {
        return Ok(status);
    }
    let options = ModalState::status_options(flow);
    let matched = filter_options(&options, input);
    match matched.as_slice() {
        [only] => only.option.value.parse().map_err(|e: RentAdminError| e.to_string()),
        [] => Err(format!("no status matches '{input}'")),
        _ => Err(format!("'{input}' matches more than one status")),
    }
}

fn handle_submit_status(
    state: &mut ListingState,
    input: &str,
    reason: Option<String>,
) -> Result<(bool, Vec<Action>)> {
    let ModalState::StatusChange { current, flow, .. } = state.modal.clone() else {
        return Err(RentAdminError::validation("status", "the status dialog is not open"));
    };
    let Some(record) = state.selected.clone() else {
        return Err(RentAdminError::validation("status", "no record selected"));
    };
    if state.is_mutating() {
        tracing::debug!("status update already pending, ignoring submit");
        return Ok((false, vec![]));
    }

    let target = match resolve_status(input, flow) {
        Ok(target) => target,
        Err(message) => {
            set_modal_error(state, message);
            return Ok((true, vec![]));
        }
    };

    let change = StatusChange::new(record.id(), target, reason);
    if let Err(violation) = validate_transition(current, &change, flow) {
        tracing::debug!(error = %violation, "status change rejected");
        state.push_toast(Toast::destructive(violation.to_string()));
        set_modal_error(state, violation.to_string());
        return Ok((true, vec![]));
    }

    state.begin_mutation();
    tracing::debug!(id = %change.id, status = %change.approval_status, "submitting status change");
    Ok((
        true,
        vec![Action::PostToWorker(WorkerMessage::update_status(state.resource(), change))],
    ))
}

fn set_modal_error(state: &mut ListingState, message: String) {
    if let ModalState::StatusChange { error, .. } = &mut state.modal {
        *error = Some(message);
    }
}

/// A mutation succeeded: close the dialog, notify, and revalidate the list.
fn mutation_succeeded(state: &mut ListingState, message: &str) -> (bool, Vec<Action>) {
    state.finish_mutation();
    state.close_modal();
    state.push_toast(Toast::success(message));

    let mut actions = vec![Action::PostToWorker(WorkerMessage::invalidate(state.resource()))];
    actions.extend(fetch_actions(state, true));
    (true, actions)
}

fn handle_worker_response(state: &mut ListingState, response: &WorkerResponse) -> Result<(bool, Vec<Action>)> {
    match response {
        WorkerResponse::ListLoaded { key, request, result } => {
            let applied = state.complete_fetch(key, *request, result.clone());
            Ok((applied, vec![]))
        }
        WorkerResponse::DebounceElapsed { ticket } => match state.commit_search(*ticket) {
            None => Ok((false, vec![])),
            Some(changed) => {
                let mut actions = vec![Action::ReplaceUrl(state.location().path_and_query())];
                if changed {
                    actions.extend(fetch_actions(state, false));
                }
                Ok((true, actions))
            }
        },
        WorkerResponse::StatusUpdated { resource, id } => {
            tracing::debug!(resource = %resource, id = %id, "status update confirmed");
            Ok(mutation_succeeded(state, "Status updated"))
        }
        WorkerResponse::RecordDeleted { resource, id } => {
            tracing::debug!(resource = %resource, id = %id, "delete confirmed");
            Ok(mutation_succeeded(state, "Deleted successfully"))
        }
        WorkerResponse::MutationFailed { resource, error } => {
            tracing::error!(resource = %resource, error = %error, "mutation failed");
            state.finish_mutation();
            state.push_toast(Toast::destructive(GENERIC_FAILURE));
            Ok((true, vec![]))
        }
        WorkerResponse::FileUploaded { field, url } => {
            tracing::debug!(field = %field, url = %url, "file uploaded");
            state.push_toast(Toast::success(format!("Uploaded {url}")));
            Ok((true, vec![]))
        }
        WorkerResponse::UploadsSettled {
            field,
            saved,
            removed,
            failed,
        } => {
            tracing::debug!(field = %field, saved = saved, removed = ?removed, failed = ?failed, "uploads settled");
            if !failed.is_empty() {
                state.push_toast(Toast::destructive(format!(
                    "Could not remove {} file(s) of {field}",
                    failed.len()
                )));
            } else if !removed.is_empty() {
                state.push_toast(Toast::success(format!("Removed {} file(s) of {field}", removed.len())));
            }
            Ok((!removed.is_empty() || !failed.is_empty(), vec![]))
        }
        WorkerResponse::Error { message } => {
            tracing::error!("Worker error: {}", message);
            state.push_toast(Toast::destructive(GENERIC_FAILURE));
            Ok((true, vec![]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::location::Location;
    use crate::app::ListingOptions;
    use crate::domain::{RemoteListResult, ResourceKind};
    use crate::fetch::{FetchError, FixtureBackend, ListData, QueryClient, RetryPolicy};
    use crate::ui::Theme;
    use std::sync::Arc;
    use std::time::Duration;

    fn vehicles_state() -> ListingState {
        let client = QueryClient::new(Arc::new(FixtureBackend::new()), Duration::from_secs(30), RetryPolicy::none());
        ListingState::new(
            ResourceKind::Vehicles,
            Location::parse("/vehicles?tab=all").unwrap(),
            &Selection::default(),
            client,
            ListingOptions::default(),
            Theme::default(),
        )
    }

    fn loaded(state: &mut ListingState, rows: Vec<serde_json::Value>) {
        let (_, actions) = handle_event(state, &Event::Mount).unwrap();
        let Some(Action::PostToWorker(WorkerMessage::FetchList { key, request, .. })) = actions.last().cloned() else {
            panic!("mount did not fetch: {actions:?}");
        };
        let total = rows.len() as u64;
        let list = rows
            .into_iter()
            .map(|row| ResourceKind::Vehicles.decode(row).unwrap())
            .collect();
        let data: ListData = Arc::new(RemoteListResult::new(list, 1, 10, total));
        let response = WorkerResponse::ListLoaded {
            key,
            request,
            result: Ok(data),
        };
        handle_event(state, &Event::WorkerResponse(response)).unwrap();
    }

    fn corolla(status: &str, modified: bool) -> serde_json::Value {
        serde_json::json!({"id": "v-1", "modelName": "Corolla", "approvalStatus": status, "isModified": modified})
    }

    fn open_status(state: &mut ListingState) {
        handle_event(state, &Event::RowAction { number: 1, action: RowAction::ChangeStatus }).unwrap();
    }

    #[test]
    fn edit_navigates_to_the_form() {
        let mut state = vehicles_state();
        loaded(&mut state, vec![corolla("PENDING", false)]);
        let (_, actions) = handle_event(&mut state, &Event::RowAction { number: 1, action: RowAction::Edit }).unwrap();
        assert_eq!(actions, vec![Action::Navigate("/vehicles/edit/v-1".to_string())]);
    }

    #[test]
    fn business_rule_violation_sends_nothing() {
        let mut state = vehicles_state();
        loaded(&mut state, vec![corolla("PENDING", false)]);
        open_status(&mut state);

        let (_, actions) = handle_event(
            &mut state,
            &Event::SubmitStatus { status: "REJECTED".to_string(), reason: None },
        )
        .unwrap();
        assert!(actions.is_empty());
        assert_eq!(
            state.toasts().last().map(|t| t.message.as_str()),
            Some("rejection reason is required when status is REJECTED")
        );
        assert!(state.modal.is_open());
    }

    #[test]
    fn partial_status_labels_resolve() {
        assert_eq!(resolve_status("appr", ReviewFlow::Registration), Ok(ApprovalStatus::Approved));
        assert!(resolve_status("under", ReviewFlow::Registration).is_err());
        assert_eq!(resolve_status("under", ReviewFlow::Modification), Ok(ApprovalStatus::UnderReview));
    }

    #[test]
    fn duplicate_submits_are_ignored() {
        let mut state = vehicles_state();
        loaded(&mut state, vec![corolla("PENDING", false)]);
        open_status(&mut state);

        let submit = Event::SubmitStatus { status: "approved".to_string(), reason: None };
        let (_, first) = handle_event(&mut state, &submit).unwrap();
        let (_, second) = handle_event(&mut state, &submit).unwrap();
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn success_closes_the_dialog_and_revalidates() {
        let mut state = vehicles_state();
        loaded(&mut state, vec![corolla("PENDING", true)]);
        open_status(&mut state);
        handle_event(&mut state, &Event::SubmitStatus { status: "under review".to_string(), reason: None }).unwrap();

        let response = WorkerResponse::StatusUpdated {
            resource: ResourceKind::Vehicles,
            id: "v-1".to_string(),
        };
        let (_, actions) = handle_event(&mut state, &Event::WorkerResponse(response)).unwrap();

        assert!(!state.modal.is_open());
        assert!(state.selected.is_none());
        assert!(matches!(actions[0], Action::PostToWorker(WorkerMessage::Invalidate { .. })));
        assert!(matches!(actions[1], Action::PostToWorker(WorkerMessage::FetchList { force: true, .. })));
    }

    #[test]
    fn failure_shows_a_generic_toast_and_allows_retry() {
        let mut state = vehicles_state();
        loaded(&mut state, vec![corolla("PENDING", false)]);
        handle_event(&mut state, &Event::RowAction { number: 1, action: RowAction::Delete }).unwrap();
        handle_event(&mut state, &Event::ConfirmDelete).unwrap();

        let failed = WorkerResponse::MutationFailed {
            resource: ResourceKind::Vehicles,
            error: FetchError::Http { status: 500, body: String::new() },
        };
        handle_event(&mut state, &Event::WorkerResponse(failed)).unwrap();

        assert_eq!(state.toasts().last().map(|t| t.message.as_str()), Some("Something went wrong"));
        assert!(state.modal.is_open());
        let (_, retry) = handle_event(&mut state, &Event::ConfirmDelete).unwrap();
        assert_eq!(retry.len(), 1);
    }

    #[test]
    fn failed_file_removals_are_reported() {
        let mut state = vehicles_state();
        let settled = WorkerResponse::UploadsSettled {
            field: "coverImage".to_string(),
            saved: false,
            removed: vec!["https://cdn/a.png".to_string()],
            failed: vec!["https://cdn/b.png".to_string()],
        };
        let (render, _) = handle_event(&mut state, &Event::WorkerResponse(settled)).unwrap();
        assert!(render);
        let toast = state.toasts().last().unwrap();
        assert_eq!(toast.kind, crate::app::ToastKind::Destructive);
        assert_eq!(toast.message, "Could not remove 1 file(s) of coverImage");
    }

    #[test]
    fn rows_outside_the_page_are_rejected() {
        let mut state = vehicles_state();
        loaded(&mut state, vec![corolla("PENDING", false)]);
        assert!(handle_event(&mut state, &Event::RowAction { number: 2, action: RowAction::Delete }).is_err());
    }

    #[test]
    fn characters_outside_search_mode_are_ignored() {
        let mut state = vehicles_state();
        assert_eq!(handle_event(&mut state, &Event::Char('k')).unwrap(), (false, vec![]));

        handle_event(&mut state, &Event::SearchMode).unwrap();
        let (render, actions) = handle_event(&mut state, &Event::Char('k')).unwrap();
        assert!(render);
        assert!(matches!(actions[0], Action::PostToWorker(WorkerMessage::ScheduleDebounce { .. })));
        assert_eq!(state.search_input, "k");
    }
}
