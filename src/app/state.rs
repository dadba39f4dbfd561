//! Listing state management and view model computation.
//!
//! This module defines [`ListingState`], the state container of one listing
//! screen. The same type drives every resource; the resource kind decides the
//! columns, the prerequisite filters and whether status tabs are shown.
//!
//! # State Components
//!
//! - **Query**: page, page size, sort order, committed search term and filters
//! - **Search input**: what the user typed, committed after the debounce delay
//! - **Location**: the screen URL, kept in sync with `search` and `tab`
//! - **Observer**: last-key-wins view of the shared list cache
//! - **Selection**: the record targeted by the open dialog
//! - **Toasts**: the latest notifications
//!
//! # Invariants
//!
//! - The page resets to 1 whenever the search term, a filter, the sort order
//!   or the page size actually changes.
//! - No fetch is started while a prerequisite filter is empty; the screen is
//!   then idle, neither loading nor failed.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use rentadmin::app::location::Location;
//! use rentadmin::app::{ListingOptions, ListingState};
//! use rentadmin::domain::ResourceKind;
//! use rentadmin::fetch::{FixtureBackend, QueryClient, RetryPolicy};
//! use rentadmin::storage::Selection;
//! use rentadmin::ui::Theme;
//!
//! let client = QueryClient::new(Arc::new(FixtureBackend::new()), Duration::from_secs(30), RetryPolicy::none());
//! let location = Location::parse("/brands?search=kia").unwrap();
//! let state = ListingState::new(
//!     ResourceKind::Brands,
//!     location,
//!     &Selection::default(),
//!     client,
//!     ListingOptions::default(),
//!     Theme::default(),
//! );
//! assert_eq!(state.query.search_term.as_deref(), Some("kia"));
//! assert_eq!(state.search_input, "kia");
//! ```

use std::time::Duration;

use super::debounce::{Debouncer, Ticket, SEARCH_DEBOUNCE};
use super::location::{Location, TabSet, SEARCH_PARAM, TAB_PARAM};
use super::modes::{InputMode, ModalState, Toast};
use super::options::highlight_ranges;
use crate::domain::error::{RentAdminError, Result};
use crate::domain::resources::APPROVAL_STATUS_FILTER;
use crate::domain::{ApprovalStatus, CellContext, ListingQuery, PageLimit, Record, ResourceKind, SortOrder};
use crate::fetch::{
    FetchError, ListData, Placeholder, QueryClient, QueryKey, QueryObserver, QueryStatus, RequestId,
};
use crate::storage::Selection;
use crate::ui::pagination::PaginationModel;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{
    DisplayRow, EmptyState, FooterInfo, HeaderInfo, ListingViewModel, ModalView, SearchBarInfo, TabInfo, TableBody,
};

/// Status tabs of resources that go through approval.
const STATUS_TABS: TabSet = TabSet::new(&["all", "pending", "approved", "rejected", "under-review"], "all");

/// Tab that shows every status.
const ALL_TAB: &str = "all";

/// Number of notifications kept on screen.
const MAX_TOASTS: usize = 3;

/// Per-screen settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOptions {
    pub placeholder: Placeholder,
    pub debounce: Duration,
    pub limit: PageLimit,
    pub sort_order: SortOrder,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            placeholder: Placeholder::default(),
            debounce: SEARCH_DEBOUNCE,
            limit: PageLimit::default(),
            sort_order: SortOrder::default(),
        }
    }
}

/// State container of one listing screen.
///
/// Mutated by the event handler only. Every mutator is synchronous and returns
/// whether the cache key changed, so the handler knows when to fetch.
#[derive(Debug)]
pub struct ListingState {
    resource: ResourceKind,

    /// Pagination, sort, committed search and filters.
    pub query: ListingQuery,

    /// Text in the search box. Committed into `query` after the debounce delay.
    pub search_input: String,

    pub input_mode: InputMode,

    /// Record targeted by the open dialog.
    ///
    /// Set by a row action, cleared when the dialog closes or a mutation
    /// succeeds.
    pub selected: Option<Record>,

    pub modal: ModalState,

    location: Location,
    tab: Option<&'static str>,
    observer: QueryObserver,
    client: QueryClient,
    debouncer: Debouncer<String>,
    toasts: Vec<Toast>,
    pending_mutation: bool,
    theme: Theme,
}

impl ListingState {
    /// Creates the state of a listing screen.
    ///
    /// The search term and input are seeded from the `search` URL parameter.
    /// Prerequisite filters are seeded from the URL first, then from the
    /// region selection.
    #[must_use]
    pub fn new(
        resource: ResourceKind,
        location: Location,
        selection: &Selection,
        client: QueryClient,
        options: ListingOptions,
        theme: Theme,
    ) -> Self {
        let search_term = location
            .param(SEARCH_PARAM)
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty());

        let mut query = ListingQuery {
            limit: options.limit,
            sort_order: options.sort_order,
            search_term: search_term.clone(),
            ..ListingQuery::default()
        };
        for key in resource.required_filters() {
            if let Some(value) = location.param(key).filter(|v| !v.is_empty()) {
                query.filters.insert((*key).to_string(), value);
            }
        }

        let mut state = Self {
            resource,
            query,
            search_input: search_term.unwrap_or_default(),
            input_mode: InputMode::Normal,
            selected: None,
            modal: ModalState::Closed,
            location,
            tab: None,
            observer: QueryObserver::new(options.placeholder),
            client,
            debouncer: Debouncer::new(options.debounce),
            toasts: Vec::new(),
            pending_mutation: false,
            theme,
        };
        state.seed_from_selection(selection, false);
        state
    }

    #[must_use]
    pub const fn resource(&self) -> ResourceKind {
        self.resource
    }

    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub const fn theme(&self) -> &Theme {
        &self.theme
    }

    #[must_use]
    pub const fn client(&self) -> &QueryClient {
        &self.client
    }

    #[must_use]
    pub const fn debounce_delay(&self) -> Duration {
        self.debouncer.delay()
    }

    #[must_use]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Active status tab, once mounted.
    #[must_use]
    pub const fn tab(&self) -> Option<&'static str> {
        self.tab
    }

    /// Status tabs of this screen, `None` for single-tab screens.
    #[must_use]
    pub fn tab_set(&self) -> Option<TabSet> {
        self.resource.has_approval().then_some(STATUS_TABS)
    }

    #[must_use]
    pub fn status(&self) -> QueryStatus {
        self.observer.status()
    }

    /// Resolves the `tab` URL parameter.
    ///
    /// Returns the rewritten location when the parameter was missing or not
    /// whitelisted and the URL must be replaced.
    pub fn mount(&mut self) -> Option<String> {
        let tabs = self.tab_set()?;
        let requested = self.location.param(TAB_PARAM);
        let (tab, redirect) = tabs.resolve(requested.as_deref());
        tracing::debug!(requested = ?requested, resolved = tab, redirect = redirect, "resolving tab");

        self.tab = Some(tab);
        self.apply_tab_filter(tab);
        if redirect {
            self.location.set_param(TAB_PARAM, tab);
            return Some(self.location.path_and_query());
        }
        None
    }

    /// Switches the status tab. Returns whether the cache key changed.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the screen has no tabs or the tab is
    /// not one of them.
    pub fn switch_tab(&mut self, name: &str) -> Result<bool> {
        let tabs = self
            .tab_set()
            .ok_or_else(|| RentAdminError::validation("tab", format!("{} has no status tabs", self.resource.title())))?;
        let tab = tabs
            .tabs()
            .iter()
            .copied()
            .find(|tab| *tab == name)
            .ok_or_else(|| RentAdminError::validation("tab", format!("unknown tab '{name}'")))?;

        self.tab = Some(tab);
        self.location.set_param(TAB_PARAM, tab);
        Ok(self.apply_tab_filter(tab))
    }

    fn apply_tab_filter(&mut self, tab: &str) -> bool {
        let status = if tab == ALL_TAB {
            None
        } else {
            ApprovalStatus::from_slug(tab).map(|status| status.as_str().to_string())
        };
        self.set_filter(APPROVAL_STATUS_FILTER, status)
    }

    /// Sets the page. Pages below 1 become 1; there is no upper clamp.
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if page == self.query.page {
            return false;
        }
        self.query.page = page;
        true
    }

    /// Moves to the next page unless the last known page is shown.
    pub fn next_page(&mut self) -> bool {
        let Some(total_pages) = self.status().data.map(|data| data.total_number_of_pages) else {
            return false;
        };
        if self.query.page >= total_pages {
            return false;
        }
        self.set_page(self.query.page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        self.query.page > 1 && self.set_page(self.query.page - 1)
    }

    /// Updates the search box and schedules its commit.
    ///
    /// The query and the page are untouched until the returned ticket fires.
    pub fn set_search_input(&mut self, text: impl Into<String>) -> Ticket {
        self.search_input = text.into();
        self.debouncer.push(self.search_input.clone())
    }

    /// Commits the search input scheduled under `ticket`.
    ///
    /// Returns `None` when a newer keystroke superseded the ticket, otherwise
    /// whether the cache key changed.
    pub fn commit_search(&mut self, ticket: Ticket) -> Option<bool> {
        let text = self.debouncer.fire(ticket)?;
        Some(self.apply_search(&text))
    }

    /// Clears the search box and the committed term immediately.
    pub fn clear_search(&mut self) -> bool {
        self.debouncer.cancel();
        self.search_input.clear();
        self.apply_search("")
    }

    /// Writes a search term into the URL and the query.
    ///
    /// A blank term removes the `search` parameter entirely.
    fn apply_search(&mut self, text: &str) -> bool {
        let term = Some(text.trim().to_string()).filter(|term| !term.is_empty());
        match &term {
            Some(term) => self.location.set_param(SEARCH_PARAM, term),
            None => {
                self.location.remove_param(SEARCH_PARAM);
            }
        }

        if term == self.query.search_term {
            return false;
        }
        tracing::debug!(term = ?term, "search committed");
        self.query.search_term = term;
        self.query.page = 1;
        true
    }

    pub fn set_sort_order(&mut self, order: SortOrder) -> bool {
        if order == self.query.sort_order {
            return false;
        }
        self.query.sort_order = order;
        self.query.page = 1;
        true
    }

    pub fn set_limit(&mut self, limit: PageLimit) -> bool {
        if limit == self.query.limit {
            return false;
        }
        self.query.limit = limit;
        self.query.page = 1;
        true
    }

    /// Sets or removes (`None` or empty) a filter.
    pub fn set_filter(&mut self, key: &str, value: Option<String>) -> bool {
        let value = value.filter(|v| !v.is_empty());
        if self.query.filters.get(key) == value.as_ref() {
            return false;
        }
        match value {
            Some(value) => {
                self.query.filters.insert(key.to_string(), value);
            }
            None => {
                self.query.filters.remove(key);
            }
        }
        self.query.page = 1;
        true
    }

    /// Applies a new region selection to the prerequisite filters.
    pub fn apply_selection(&mut self, selection: &Selection) -> bool {
        self.seed_from_selection(selection, true)
    }

    fn seed_from_selection(&mut self, selection: &Selection, overwrite: bool) -> bool {
        let defaults = selection.filter_defaults();
        let mut changed = false;
        for key in Selection::FILTER_KEYS {
            if !self.resource.required_filters().contains(&key) {
                continue;
            }
            let value = defaults.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone());
            if overwrite || (self.query.filter(key).is_none() && value.is_some()) {
                changed |= self.set_filter(key, value);
            }
        }
        changed
    }

    /// Prerequisite filters that are still empty.
    #[must_use]
    pub fn missing_prerequisites(&self) -> Vec<&'static str> {
        self.resource
            .required_filters()
            .iter()
            .copied()
            .filter(|key| self.query.filter(key).is_none())
            .collect()
    }

    /// Whether the list may be fetched.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.missing_prerequisites().is_empty()
    }

    #[must_use]
    pub fn cache_key(&self) -> QueryKey {
        QueryKey::new(self.resource, &self.query)
    }

    /// Points the observer at the current key.
    ///
    /// Returns the key to request with the id its response must carry, or
    /// `None` while the screen is disabled.
    pub fn begin_fetch(&mut self) -> Option<(QueryKey, RequestId)> {
        if !self.is_enabled() {
            tracing::debug!(missing = ?self.missing_prerequisites(), "fetch disabled");
            self.observer.disable();
            return None;
        }
        let key = self.cache_key();
        let cached = self.client.peek(&key);
        let request = self.observer.begin(key.clone(), cached);
        Some((key, request))
    }

    /// Applies a list response. Returns `false` when it was stale.
    pub fn complete_fetch(
        &mut self,
        key: &QueryKey,
        request: RequestId,
        result: std::result::Result<ListData, FetchError>,
    ) -> bool {
        self.observer.complete(key, request, result)
    }

    /// Record on the current page by its one-based row number.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no such row is shown.
    pub fn row(&self, number: usize) -> Result<Record> {
        self.status()
            .data
            .and_then(|data| number.checked_sub(1).and_then(|index| data.list.get(index).cloned()))
            .ok_or_else(|| RentAdminError::validation("row", format!("no row {number} on this page")))
    }

    /// Marks a mutation as in flight. Returns `false` if one already is.
    pub fn begin_mutation(&mut self) -> bool {
        if self.pending_mutation {
            tracing::debug!("mutation already pending, ignoring submit");
            return false;
        }
        self.pending_mutation = true;
        true
    }

    pub fn finish_mutation(&mut self) {
        self.pending_mutation = false;
    }

    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        self.pending_mutation
    }

    /// Closes the dialog and forgets its target.
    pub fn close_modal(&mut self) {
        self.modal = ModalState::Closed;
        self.selected = None;
    }

    pub fn push_toast(&mut self, toast: Toast) {
        self.toasts.push(toast);
        if self.toasts.len() > MAX_TOASTS {
            let excess = self.toasts.len() - MAX_TOASTS;
            self.toasts.drain(..excess);
        }
    }

    /// Transforms the state into a renderable view model.
    #[must_use]
    pub fn compute_viewmodel(&self) -> ListingViewModel {
        let status = self.status();
        let ctx = CellContext::now();

        ListingViewModel {
            header: self.compute_header(&status),
            search_bar: SearchBarInfo {
                query: self.search_input.clone(),
                is_focused: self.input_mode == InputMode::Search,
                is_pending: self.debouncer.pending().is_some(),
            },
            columns: self.resource.headers(),
            body: self.compute_body(&status, &ctx),
            pagination: status.data.as_ref().and_then(|data| {
                PaginationModel::compute(self.query.page, data.total_number_of_pages, data.total)
            }),
            stale_error: match (&status.data, &status.error) {
                (Some(_), Some(error)) => Some(error.message()),
                _ => None,
            },
            footer: FooterInfo {
                keybindings: self.keybindings().to_string(),
                toasts: self.toasts.clone(),
            },
            modal: self.compute_modal(),
        }
    }

    fn compute_header(&self, status: &QueryStatus) -> HeaderInfo {
        let tabs = self.tab_set().map_or_else(Vec::new, |tabs| {
            tabs.tabs()
                .iter()
                .map(|&name| TabInfo {
                    name,
                    is_active: self.tab == Some(name),
                })
                .collect()
        });

        HeaderInfo {
            title: self.resource.title().to_string(),
            location: self.location.path_and_query(),
            tabs,
            summary: status.data.as_ref().map(|data| {
                format!(
                    "{} {}, page {} of {}",
                    data.total,
                    self.resource.noun(),
                    self.query.page,
                    data.total_number_of_pages.max(1)
                )
            }),
            is_fetching: status.is_fetching,
        }
    }

    fn compute_body(&self, status: &QueryStatus, ctx: &CellContext) -> TableBody {
        let missing = self.missing_prerequisites();
        if !missing.is_empty() {
            return TableBody::Empty(EmptyState {
                message: format!("Select a {} to see {}", prerequisite_label(missing[0]), self.resource.noun()),
                subtitle: "Pick one in the region selector".to_string(),
            });
        }

        let Some(data) = &status.data else {
            if let Some(error) = &status.error {
                return TableBody::Error {
                    message: error.message(),
                    retry_hint: "Type :refresh to try again".to_string(),
                };
            }
            return TableBody::Loading {
                skeleton_rows: self.query.limit.value() as usize,
            };
        };

        if data.is_empty() {
            if status.is_placeholder && status.is_fetching {
                return TableBody::Loading {
                    skeleton_rows: self.query.limit.value() as usize,
                };
            }
            return TableBody::Empty(self.empty_state());
        }

        let term = self.query.search_term.as_deref().unwrap_or_default();
        let target = self.modal.is_open().then(|| self.selected.as_ref()).flatten();
        TableBody::Rows(
            data.list
                .iter()
                .enumerate()
                .map(|(index, record)| DisplayRow {
                    number: index + 1,
                    cells: record.cells(ctx),
                    highlight_ranges: highlight_ranges(record.display_name(), term),
                    status: record.approval_status(),
                    is_selected: target.is_some_and(|selected| selected.id() == record.id()),
                })
                .collect(),
        )
    }

    fn empty_state(&self) -> EmptyState {
        let noun = self.resource.noun();
        match &self.query.search_term {
            Some(term) => EmptyState {
                message: format!("No {noun} found for '{term}'"),
                subtitle: "Try a different search term".to_string(),
            },
            None if self.query.filter(APPROVAL_STATUS_FILTER).is_some() => EmptyState {
                message: format!("No {noun} found"),
                subtitle: "Nothing in this tab yet".to_string(),
            },
            None => EmptyState {
                message: format!("No {noun} found"),
                subtitle: "Nothing has been added yet".to_string(),
            },
        }
    }

    fn compute_modal(&self) -> Option<ModalView> {
        let selected = self.selected.as_ref()?;
        match &self.modal {
            ModalState::Closed => None,
            ModalState::StatusChange { current, flow, error } => Some(ModalView {
                title: format!("Change status of {}", selected.display_name()),
                lines: vec![format!("Current status: {current}"), "Available statuses:".to_string()],
                options: ModalState::status_options(*flow),
                error: error.clone(),
                hint: ":submit STATUS [reason] | :close".to_string(),
            }),
            ModalState::ConfirmDelete => Some(ModalView {
                title: format!("Delete {}?", selected.display_name()),
                lines: vec!["This cannot be undone.".to_string()],
                options: Vec::new(),
                error: None,
                hint: ":confirm | :close".to_string(),
            }),
        }
    }

    const fn keybindings(&self) -> &'static str {
        match self.input_mode {
            InputMode::Search => "type to search | enter: done | esc: clear",
            InputMode::Normal => {
                "/text: search | :next :prev :page N | :sort asc|desc | :limit N | :edit N :delete N :status N | :quit"
            }
        }
    }
}

/// Human name of a prerequisite filter key (`stateId` → `state`).
fn prerequisite_label(key: &str) -> &str {
    key.strip_suffix("Id").unwrap_or(key)
}
