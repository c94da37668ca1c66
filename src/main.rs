use dbw::api::poller::{self, Poller};
use dbw::api::ApiClient;
use dbw::app::{self, AppState, SelectionRefresh};
use dbw::browser;
use dbw::cli::Cli;
use dbw::config::Settings;
use dbw::events::{AppEvent, EventHandler};
use dbw::input::{self, Action, InputContext, OverlayMode};
use dbw::selection::DraftFocus;
use dbw::store::{self, SelectionStore};
use dbw::traits::JobsApi;
use dbw::tui;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

fn setup_verbose_logging() -> Result<()> {
    let state_dir = store::state_dir();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .init();
    tracing::info!(
        "dbw v{} starting with verbose logging",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn spawn_monitored(
    tx: UnboundedSender<AppEvent>,
    label: &'static str,
    fut: impl Future<Output = ()> + Send + 'static,
) {
    tokio::spawn(async move {
        let handle = tokio::spawn(fut);
        if let Err(join_err) = handle.await {
            let msg = if join_err.is_panic() {
                match join_err.into_panic().downcast::<String>() {
                    Ok(s) => *s,
                    Err(payload) => match payload.downcast::<&str>() {
                        Ok(s) => s.to_string(),
                        Err(_) => "unknown panic".to_string(),
                    },
                }
            } else {
                "task cancelled".to_string()
            };
            tracing::error!("{label} panicked: {msg}");
            if tx
                .send(AppEvent::Error(format!("{label} crashed: {msg}")))
                .is_err()
            {
                tracing::warn!("{label}: channel closed while reporting panic");
            }
        }
    });
}

/// Shared handles the event loop needs to start background work.
struct Runtime {
    api: Arc<dyn JobsApi>,
    store: SelectionStore,
    tx: UnboundedSender<AppEvent>,
    max_in_flight: usize,
}

impl Runtime {
    /// Full refresh: job list first, last runs follow on `JobsLoaded`.
    fn refresh(&self, state: &mut AppState) {
        let generation = state.begin_refresh();
        self.fetch_jobs(generation);
    }

    fn fetch_jobs(&self, generation: u64) {
        tracing::debug!("starting refresh generation {generation}");
        let api = self.api.clone();
        let tx = self.tx.clone();
        spawn_monitored(self.tx.clone(), "refresh", async move {
            poller::fetch_jobs(api, generation, tx).await;
        });
    }

    fn fetch_last_runs(&self, generation: u64, job_ids: Vec<String>) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        let max_in_flight = self.max_in_flight;
        spawn_monitored(self.tx.clone(), "last_runs", async move {
            poller::send_last_runs(api, generation, job_ids, max_in_flight, tx).await;
        });
    }

    fn fetch_runs(&self, job_id: String) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        spawn_monitored(self.tx.clone(), "runs", async move {
            poller::fetch_runs_for_job(api, job_id, tx).await;
        });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    if args.verbose {
        setup_verbose_logging()?;
    }

    // Configuration errors are reported before the terminal is touched
    let settings = Settings::load(&args)?;
    tracing::info!("resolved settings: {settings:?}");
    let api: Arc<dyn JobsApi> = Arc::new(ApiClient::new(&settings.api)?);
    let store = SelectionStore::in_dir(&store::state_dir());
    let selection = store.load()?;

    let mut state = AppState::new(
        app::AppConfig {
            environment: settings.api.environment.clone(),
            host: settings.api.host.clone(),
            max_in_flight: settings.max_in_flight,
        },
        selection,
    );
    state.poll_interval = settings.refresh_interval;

    // Setup terminal with panic hook
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, SetTitle("")) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        SetTitle(format!("dbw {}", settings.api.environment))
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let events = EventHandler::new(Duration::from_millis(100));
    let tx = events.sender();

    let poller_handle = (settings.refresh_interval > 0).then(|| {
        let poller = Poller::new(Duration::from_secs(settings.refresh_interval), tx.clone());
        tokio::spawn(poller.run())
    });

    let runtime = Runtime {
        api,
        store,
        tx,
        max_in_flight: settings.max_in_flight,
    };
    let result = run_app(&mut terminal, &mut state, events, &runtime).await;

    if let Some(handle) = poller_handle {
        handle.abort();
    }

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, SetTitle(""))?;
    terminal.show_cursor()?;

    result
}

fn input_context(state: &AppState) -> InputContext {
    InputContext {
        has_error: state.error.is_some(),
        is_loading: state.is_loading,
        overlay: match &state.overlay {
            app::ActiveOverlay::Select(draft) if draft.focus == DraftFocus::Search => {
                OverlayMode::Search
            }
            app::ActiveOverlay::Select(_) => OverlayMode::Select,
            app::ActiveOverlay::Runs(_) => OverlayMode::Runs,
            app::ActiveOverlay::None => OverlayMode::None,
        },
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut events: EventHandler,
    rt: &Runtime,
) -> Result<()> {
    let mut last_tick = Instant::now();
    let mut poll_start = Instant::now();

    rt.refresh(state);

    loop {
        match terminal.size() {
            Ok(size) => state.columns = tui::cards::columns_for(size.width),
            Err(e) => tracing::warn!("terminal size query failed: {e}"),
        }

        terminal.draw(|f| tui::render::render(f, state))?;

        // Update countdown
        if state.poll_interval > 0 {
            let elapsed = poll_start.elapsed().as_secs();
            state.next_poll_in = state.poll_interval.saturating_sub(elapsed);
        }

        state.prune_notifications();
        state.prune_error();

        let Some(event) = events.next().await else {
            return Ok(());
        };
        match event {
            AppEvent::Key(key) => {
                let ctx = input_context(state);
                match input::map_key(key, &ctx) {
                    Action::Quit => state.should_quit = true,
                    Action::DismissError => state.clear_error(),
                    Action::MoveUp => match ctx.overlay {
                        OverlayMode::Select => {
                            if let Some(draft) = state.draft_mut() {
                                draft.move_up();
                            }
                        }
                        OverlayMode::Runs => state.runs_cursor_up(),
                        _ => state.move_up(),
                    },
                    Action::MoveDown => match ctx.overlay {
                        OverlayMode::Select => {
                            if let Some(draft) = state.draft_mut() {
                                draft.move_down();
                            }
                        }
                        OverlayMode::Runs => state.runs_cursor_down(),
                        _ => state.move_down(),
                    },
                    Action::MoveLeft => state.move_left(),
                    Action::MoveRight => state.move_right(),
                    Action::Refresh => {
                        rt.refresh(state);
                        poll_start = Instant::now();
                    }
                    Action::ShowRuns => {
                        if let Some(job_id) = state.open_runs_overlay() {
                            rt.fetch_runs(job_id);
                        }
                    }
                    Action::ReloadRuns => {
                        if let Some(job_id) = state.reload_runs() {
                            rt.fetch_runs(job_id);
                        }
                    }
                    Action::OpenRunPage => match state.current_run_url() {
                        Some(url) => {
                            let url = url.to_string();
                            let tx = rt.tx.clone();
                            spawn_monitored(rt.tx.clone(), "open_browser", async move {
                                if let Err(e) = browser::open_in_browser(&url).await {
                                    tracing::warn!("{e}");
                                    if tx.send(AppEvent::Error(e.to_string())).is_err() {
                                        tracing::warn!("open_browser: channel closed");
                                    }
                                }
                            });
                            state.notify("Opening run page".to_string());
                        }
                        None => state.set_error("No run page for this run".to_string()),
                    },
                    Action::OpenSelection => {
                        if state.jobs_loaded {
                            state.open_select_overlay();
                        } else {
                            state.set_error("Jobs are still loading".to_string());
                        }
                    }
                    Action::ToggleCheckbox => {
                        if let Some(draft) = state.draft_mut() {
                            draft.toggle_current();
                        }
                    }
                    Action::SelectAll => {
                        if let Some(draft) = state.draft_mut() {
                            draft.set_all(true);
                        }
                    }
                    Action::ClearAll => {
                        if let Some(draft) = state.draft_mut() {
                            draft.set_all(false);
                        }
                    }
                    Action::FocusSearch => {
                        if let Some(draft) = state.draft_mut() {
                            draft.focus = DraftFocus::Search;
                        }
                    }
                    Action::LeaveSearch => {
                        if let Some(draft) = state.draft_mut() {
                            draft.focus = DraftFocus::List;
                        }
                    }
                    Action::SearchInput(c) => {
                        if let Some(draft) = state.draft_mut() {
                            draft.push_query(c);
                        }
                    }
                    Action::SearchBackspace => {
                        if let Some(draft) = state.draft_mut() {
                            draft.pop_query();
                        }
                    }
                    Action::ApplySelection => {
                        if let Some(committed) = state.apply_selection() {
                            match rt.store.save(&committed) {
                                Ok(()) => state.notify(format!(
                                    "Showing {} of {} jobs",
                                    state.visible.len(),
                                    state.jobs.len()
                                )),
                                Err(e) => {
                                    tracing::warn!("failed to save selection: {e}");
                                    state.set_error(format!("Selection not saved: {e}"));
                                }
                            }
                            match state.begin_selection_refresh() {
                                SelectionRefresh::Full(generation) => rt.fetch_jobs(generation),
                                SelectionRefresh::LastRuns(generation, job_ids) => {
                                    rt.fetch_last_runs(generation, job_ids);
                                }
                            }
                        }
                    }
                    Action::CloseOverlay => {
                        if state.has_select_overlay() {
                            state.cancel_selection();
                        } else {
                            state.close_overlay();
                        }
                    }
                    Action::None => {}
                }
            }
            AppEvent::Tick => {
                if last_tick.elapsed() >= Duration::from_millis(100) {
                    state.advance_spinner();
                    last_tick = Instant::now();
                }
            }
            AppEvent::AutoRefresh => {
                if state.is_loading {
                    tracing::debug!("auto-refresh skipped, refresh already in flight");
                } else {
                    rt.refresh(state);
                }
                poll_start = Instant::now();
            }
            AppEvent::JobsLoaded { generation, jobs } => {
                if let Some(job_ids) = state.apply_jobs(generation, jobs) {
                    rt.fetch_last_runs(generation, job_ids);
                }
            }
            AppEvent::LastRunsLoaded {
                generation,
                last_runs,
            } => {
                if state.apply_last_runs(generation, last_runs) {
                    state.clear_error();
                }
            }
            AppEvent::RefreshFailed { generation, error } => {
                state.refresh_failed(generation, error);
            }
            AppEvent::RunsLoaded { job_id, runs } => {
                if !state.apply_runs(&job_id, runs) {
                    tracing::debug!("dropping runs for job {job_id}, table no longer open");
                }
            }
            AppEvent::Error(e) => {
                state.task_failed(e);
            }
        }

        if state.should_quit {
            return Ok(());
        }
    }
}
