//! Console wrapper and entry point.
//!
//! This module provides the thin integration layer between the rentadmin
//! library and a terminal: it reads line commands from stdin, translates them
//! to library events, executes the resulting actions and prints the rendered
//! listing screen.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────┐
//! │  current-thread tokio runtime   │
//! │  ┌──────────────────────────┐   │
//! │  │  Console (ListingState)  │   │  ← Commands, rendering
//! │  └──────────────────────────┘   │
//! │        │ WorkerMessage   ▲      │
//! │        ▼                 │      │
//! │  ┌──────────────────────────┐   │
//! │  │  RentAdminWorker         │   │  ← Fetches, mutations, timers
//! │  │  (spawned tasks)         │   │
//! │  └──────────────────────────┘   │
//! └─────────────────────────────────┘
//! ```
//!
//! # Commands
//!
//! - `/text`: type into the search box (committed after the debounce delay)
//! - `:page N`, `:next`, `:prev`: pagination
//! - `:sort [asc|desc]`, `:limit N`: sort order and page size
//! - `:filter KEY VALUE`, `:unfilter KEY`: extra filters
//! - `:tab NAME`: status tab
//! - `:clear`: clear the search immediately
//! - `:edit N`, `:delete N`, `:status N [STATUS [REASON]]`: row actions
//! - `:confirm`, `:submit STATUS [REASON]`, `:close`: dialogs
//! - `:region state|parent|country ID NAME` (or `-` to clear), `:country CODE|-`
//! - `:upload FIELD PATH`, `:unlink FIELD URL`, `:save FIELD`, `:abandon FIELD`
//! - `:refresh`, `:help`, `:quit`

#![allow(clippy::multiple_crate_versions)]

use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use rentadmin::app::location::Location;
use rentadmin::app::RowAction;
use rentadmin::domain::{PageLimit, SortOrder};
use rentadmin::fetch::QueryClient;
use rentadmin::storage::{JsonStorage, MemoryStorage, RegionRef, RegionSlot, SelectionProvider, Storage, UploadTracker};
use rentadmin::worker::{RentAdminWorker, WorkerMessage};
use rentadmin::{handle_event, infrastructure, Action, Config, Event, ListingState, RentAdminError, ResourceKind};

const HELP: &str = "\
/text                          search
:page N | :next | :prev        paginate
:sort [asc|desc] | :limit N    sort order, page size
:filter KEY VALUE | :unfilter KEY
:tab NAME | :clear
:edit N | :delete N | :status N [STATUS [REASON]]
:confirm | :submit STATUS [REASON] | :close
:region state|parent|country ID NAME | :region SLOT - | :country CODE|-
:upload FIELD PATH | :unlink FIELD URL | :save FIELD | :abandon FIELD
:refresh | :help | :quit";

/// Admin listing console for the rental marketplace API.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file (default: <config dir>/rentadmin/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listing to open, e.g. `vehicles`, `companies`, `locations`.
    #[arg(long)]
    resource: Option<String>,

    /// Initial screen URL, e.g. `/vehicles?tab=pending&search=kia`.
    #[arg(long)]
    url: Option<String>,

    /// Serve lists from a JSON fixture file instead of the API.
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Keep selection and upload records in memory only.
    #[arg(long)]
    no_persist: bool,

    /// Override a config value, e.g. `--set listing.limit=20`.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Events(Vec<Event>),
    Region { slot: RegionSlot, region: Option<RegionRef> },
    Country(Option<String>),
    Help,
}

/// Console state wrapper.
///
/// Wraps the library's `ListingState` with terminal concerns: the worker, the
/// selection store and output.
struct Console {
    state: ListingState,
    worker: RentAdminWorker,
    selection: SelectionProvider,
    columns: usize,
    clear_screen: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rentadmin: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> rentadmin::Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    config.apply_overrides(&parse_overrides(&args.overrides)?)?;
    config.apply_env();
    rentadmin::observability::init_tracing(&config.observability);

    let span = tracing::debug_span!("console_load");
    let guard = span.enter();

    let resource: ResourceKind = args
        .resource
        .as_deref()
        .or(config.listing.resource.as_deref())
        .unwrap_or("vehicles")
        .parse()?;
    let location = Location::parse(&args.url.unwrap_or_else(|| format!("/{}", resource.slug())))?;

    let (selection_store, upload_store): (Box<dyn Storage>, Box<dyn Storage>) = if args.no_persist {
        (Box::new(MemoryStorage::new()), Box::new(MemoryStorage::new()))
    } else {
        (
            Box::new(JsonStorage::new(infrastructure::selection_file())?),
            Box::new(JsonStorage::new(infrastructure::uploads_file())?),
        )
    };
    let selection = SelectionProvider::load(selection_store)?;

    let fixtures = args.fixtures.as_deref().map(|path| infrastructure::expand_tilde(&path.to_string_lossy()));
    let backend = config.backend(fixtures.as_deref())?;
    let client = QueryClient::new(backend, config.stale_time(), config.retry);

    let (responses_tx, mut responses) = mpsc::unbounded_channel();
    let mut worker = RentAdminWorker::new(client.clone(), UploadTracker::new(upload_store), responses_tx);
    let state = rentadmin::initialize(&config, resource, location, &selection.snapshot(), client);

    worker.handle_message(WorkerMessage::reconcile_uploads());

    let mut console = Console {
        state,
        worker,
        selection,
        columns: config.ui.columns,
        clear_screen: std::io::stdout().is_terminal(),
    };
    tracing::debug!(resource = %resource, "console loaded");
    drop(guard);

    console.dispatch(&Event::Mount);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(Some(command)) => {
                        if console.execute(command) {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(message) => eprintln!("{message}"),
                }
            }
            Some(response) = responses.recv() => {
                console.dispatch(&Event::WorkerResponse(response));
            }
        }
    }

    tracing::debug!("console closed");
    Ok(())
}

impl Console {
    /// Runs a command. Returns `true` when the console should exit.
    fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::Events(events) => {
                for event in &events {
                    if self.dispatch(event) {
                        return true;
                    }
                }
                false
            }
            Command::Region { slot, region } => {
                let selection = self.selection.set_region(slot, region);
                self.selection_changed(selection)
            }
            Command::Country(code) => {
                let selection = self.selection.set_app_country(code);
                self.selection_changed(selection)
            }
            Command::Help => {
                println!("{HELP}");
                false
            }
        }
    }

    fn selection_changed(&mut self, selection: rentadmin::Result<rentadmin::storage::Selection>) -> bool {
        match selection {
            Ok(selection) => self.dispatch(&Event::SelectionChanged(selection)),
            Err(e) => {
                tracing::error!(error = %e, "failed to persist selection");
                eprintln!("{e}");
                false
            }
        }
    }

    /// Handles one event and executes its actions. Returns `true` on quit.
    fn dispatch(&mut self, event: &Event) -> bool {
        let span = tracing::debug_span!("console_event", event_type = %event_name(event));
        let _guard = span.enter();

        match handle_event(&mut self.state, event) {
            Ok((should_render, actions)) => {
                tracing::debug!(
                    action_count = actions.len(),
                    should_render = should_render,
                    "event handled successfully"
                );
                let mut quit = false;
                for action in actions {
                    quit |= self.execute_action(action);
                }
                if should_render && !quit {
                    self.render();
                }
                quit
            }
            Err(e) => {
                tracing::debug!(error = %e, "error handling event");
                eprintln!("{e}");
                false
            }
        }
    }

    fn execute_action(&mut self, action: Action) -> bool {
        match action {
            Action::PostToWorker(message) => {
                tracing::debug!(message = ?message, "posting message to worker");
                self.worker.handle_message(message);
            }
            Action::ReplaceUrl(url) => {
                tracing::debug!(url = %url, "url replaced");
            }
            Action::Navigate(url) => {
                tracing::info!(url = %url, "navigating away from listing");
                println!("→ {url}");
            }
            Action::Quit => return true,
        }
        false
    }

    fn render(&self) {
        let screen = rentadmin::ui::render(&self.state, self.columns);
        if self.clear_screen {
            print!("\u{1b}[2J\u{1b}[H");
        }
        println!("{screen}");
    }
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::WorkerResponse(_) => "WorkerResponse",
        Event::Char(_) | Event::Backspace | Event::SetSearchInput(_) => "SearchInput",
        Event::RowAction { .. } => "RowAction",
        Event::SubmitStatus { .. } => "SubmitStatus",
        _ => "Command",
    }
}

fn parse_overrides(pairs: &[String]) -> rentadmin::Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| RentAdminError::Config(format!("expected KEY=VALUE, got '{pair}'")))
        })
        .collect()
}

/// Parses one console line. Blank lines yield `None`.
fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }
    if let Some(text) = line.strip_prefix('/') {
        return Ok(Some(Command::Events(vec![Event::SetSearchInput(text.to_string())])));
    }
    let Some(command) = line.trim().strip_prefix(':') else {
        return Err(format!("unknown input '{line}' (type :help)"));
    };

    let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    let rest = rest.trim();
    let events = |events: Vec<Event>| Ok(Some(Command::Events(events)));

    match name {
        "page" => events(vec![Event::SetPage(number(rest)?)]),
        "next" => events(vec![Event::NextPage]),
        "prev" => events(vec![Event::PreviousPage]),
        "sort" if rest.is_empty() => events(vec![Event::ToggleSortOrder]),
        "sort" => {
            let order: SortOrder = rest.parse().map_err(|e: RentAdminError| e.to_string())?;
            events(vec![Event::SetSortOrder(order)])
        }
        "limit" => {
            let limit = PageLimit::try_from(number::<u32>(rest)?).map_err(|e| e.to_string())?;
            events(vec![Event::SetLimit(limit)])
        }
        "filter" => {
            let (key, value) = two_args(rest, "filter KEY VALUE")?;
            events(vec![Event::SetFilter {
                key: key.to_string(),
                value: Some(value.to_string()),
            }])
        }
        "unfilter" => events(vec![Event::SetFilter {
            key: one_arg(rest, "unfilter KEY")?.to_string(),
            value: None,
        }]),
        "tab" => events(vec![Event::SwitchTab(one_arg(rest, "tab NAME")?.to_string())]),
        "clear" => events(vec![Event::ClearSearch]),
        "edit" => events(vec![row_action(rest, RowAction::Edit)?]),
        "delete" => events(vec![row_action(rest, RowAction::Delete)?]),
        "status" => {
            let (row, status) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let mut list = vec![row_action(row, RowAction::ChangeStatus)?];
            if !status.trim().is_empty() {
                list.push(submit_status(status.trim()));
            }
            events(list)
        }
        "submit" => {
            one_arg(rest, "submit STATUS [REASON]")?;
            events(vec![submit_status(rest)])
        }
        "confirm" => events(vec![Event::ConfirmDelete]),
        "close" => events(vec![Event::CloseModal]),
        "refresh" => events(vec![Event::Refresh]),
        "upload" => {
            let (field, path) = two_args(rest, "upload FIELD PATH")?;
            events(vec![Event::UploadFile {
                field: field.to_string(),
                path: infrastructure::expand_tilde(path),
            }])
        }
        "unlink" => {
            let (field, url) = two_args(rest, "unlink FIELD URL")?;
            events(vec![Event::RemoveUpload {
                field: field.to_string(),
                url: url.to_string(),
            }])
        }
        "save" | "abandon" => events(vec![Event::SettleUploads {
            field: one_arg(rest, "save FIELD")?.to_string(),
            saved: name == "save",
        }]),
        "region" => parse_region(rest).map(Some),
        "country" => {
            let code = one_arg(rest, "country CODE|-")?;
            Ok(Some(Command::Country((code != "-").then(|| code.to_string()))))
        }
        "help" => Ok(Some(Command::Help)),
        "quit" | "q" => events(vec![Event::Quit]),
        other => Err(format!("unknown command ':{other}' (type :help)")),
    }
}

fn parse_region(rest: &str) -> Result<Command, String> {
    let usage = "region state|parent|country ID NAME";
    let (slot, region) = two_args(rest, usage)?;
    let slot = match slot {
        "state" => RegionSlot::State,
        "parent" => RegionSlot::ParentState,
        "country" => RegionSlot::Country,
        "legacy-parent" => RegionSlot::LegacyParentState,
        _ => return Err(format!("usage: :{usage}")),
    };
    if region == "-" {
        return Ok(Command::Region { slot, region: None });
    }
    let (id, name) = two_args(region, usage)?;
    Ok(Command::Region {
        slot,
        region: Some(RegionRef::new(id, name)),
    })
}

fn submit_status(text: &str) -> Event {
    // A multi-word status label ("under review") has no reason; otherwise
    // the first word is the status and the remainder the reason.
    let (status, rest) = first_word(text);
    if status.eq_ignore_ascii_case("under") {
        let (second, after) = first_word(rest.trim_start());
        if second.eq_ignore_ascii_case("review") {
            let after = after.trim();
            return Event::SubmitStatus {
                status: "UNDER_REVIEW".to_string(),
                reason: (!after.is_empty()).then(|| after.to_string()),
            };
        }
    }
    let reason = rest.trim();
    Event::SubmitStatus {
        status: status.to_string(),
        reason: (!reason.is_empty()).then(|| reason.to_string()),
    }
}

fn first_word(text: &str) -> (&str, &str) {
    text.split_once(char::is_whitespace).unwrap_or((text, ""))
}

fn row_action(rest: &str, action: RowAction) -> Result<Event, String> {
    Ok(Event::RowAction {
        number: number(one_arg(rest, "row number")?)?,
        action,
    })
}

fn number<T: std::str::FromStr>(text: &str) -> Result<T, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("expected a number, got '{text}'"))
}

fn one_arg<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("usage: :{usage}"))
    } else {
        Ok(rest)
    }
}

fn two_args<'a>(rest: &'a str, usage: &str) -> Result<(&'a str, &'a str), String> {
    rest.split_once(char::is_whitespace)
        .map(|(first, second)| (first, second.trim()))
        .filter(|(_, second)| !second.is_empty())
        .ok_or_else(|| format!("usage: :{usage}"))
}
