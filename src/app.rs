use crate::model::{Job, Run};
use crate::selection::{self, SelectionDraft, SelectionMap};
use std::collections::HashMap;
use std::time::Instant;

// UI constants
pub const NOTIFICATION_TTL_SECS: u64 = 5;
pub const SPINNER_FRAME_COUNT: usize = 10;
pub const NARROW_WIDTH_THRESHOLD: u16 = 60;
pub const ERROR_TTL_SECS: u64 = 10;
pub const CARD_WIDTH: u16 = 32;
pub const CARD_HEIGHT: u16 = 8;

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub timestamp: Instant,
}

/// Run history for one job, shown as a table.
#[derive(Debug, Clone)]
pub struct RunsView {
    pub job_id: String,
    pub job_name: String,
    pub runs: Vec<Run>,
    pub loaded: bool,
    pub cursor: usize,
}

/// What to fetch after the selection changed.
#[derive(Debug, PartialEq, Eq)]
pub enum SelectionRefresh {
    /// A job list was still pending; refetch everything under this generation.
    Full(u64),
    /// Job list is current; fetch last runs for the new visible set.
    LastRuns(u64, Vec<String>),
}

pub enum ActiveOverlay {
    None,
    Select(SelectionDraft),
    Runs(RunsView),
}

/// Immutable configuration set at startup.
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub max_in_flight: usize,
}

pub struct AppState {
    pub config: AppConfig,

    // Remote data, replaced wholesale on every refresh
    pub jobs: Vec<Job>,
    pub last_runs: HashMap<String, Option<Run>>,
    pub jobs_loaded: bool,

    // Selection
    pub selection: Option<SelectionMap>,
    pub visible: Vec<Job>,

    // Card grid navigation
    pub cursor: usize,
    pub columns: usize,

    // Refresh bookkeeping
    pub generation: u64,
    /// Generation whose job list is currently shown.
    pub jobs_generation: u64,
    pub is_loading: bool,
    pub last_refresh: Option<Instant>,
    pub poll_interval: u64,
    pub next_poll_in: u64,

    // Transient UI
    pub notifications: Vec<Notification>,
    pub error: Option<(String, Instant)>,
    pub spinner_frame: usize,
    pub should_quit: bool,

    pub overlay: ActiveOverlay,
}

impl AppState {
    pub fn new(config: AppConfig, selection: Option<SelectionMap>) -> Self {
        Self {
            config,
            jobs: Vec::new(),
            last_runs: HashMap::new(),
            jobs_loaded: false,
            selection,
            visible: Vec::new(),
            cursor: 0,
            columns: 1,
            generation: 0,
            jobs_generation: 0,
            is_loading: false,
            last_refresh: None,
            poll_interval: 0,
            next_poll_in: 0,
            notifications: Vec::new(),
            error: None,
            spinner_frame: 0,
            should_quit: false,
            overlay: ActiveOverlay::None,
        }
    }

    /// Starts a new refresh and returns its generation. Results tagged with any older
    /// generation are dropped from now on.
    pub fn begin_refresh(&mut self) -> u64 {
        self.generation += 1;
        self.is_loading = true;
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Stores a fresh job list. Returns the job ids whose last runs should be fetched, or
    /// `None` if the list belongs to a superseded refresh.
    pub fn apply_jobs(&mut self, generation: u64, jobs: Vec<Job>) -> Option<Vec<String>> {
        if !self.is_current(generation) {
            tracing::debug!(
                "dropping job list from generation {generation} (current {})",
                self.generation
            );
            return None;
        }
        self.jobs = jobs;
        self.jobs_loaded = true;
        self.jobs_generation = generation;
        self.reconcile();
        Some(self.visible_job_ids())
    }

    /// Replaces the last-run map. Stale generations are discarded, never merged.
    pub fn apply_last_runs(
        &mut self,
        generation: u64,
        last_runs: HashMap<String, Option<Run>>,
    ) -> bool {
        if !self.is_current(generation) {
            tracing::debug!(
                "dropping last runs from generation {generation} (current {})",
                self.generation
            );
            return false;
        }
        self.last_runs = last_runs;
        self.is_loading = false;
        self.last_refresh = Some(Instant::now());
        true
    }

    /// Starts the refresh that follows a selection change. A job list still in flight
    /// would be superseded, so it is requested again instead of being lost.
    pub fn begin_selection_refresh(&mut self) -> SelectionRefresh {
        let job_list_pending = self.is_loading && self.jobs_generation != self.generation;
        let generation = self.begin_refresh();
        if job_list_pending {
            SelectionRefresh::Full(generation)
        } else {
            SelectionRefresh::LastRuns(generation, self.visible_job_ids())
        }
    }

    /// A background task died without reporting its generation.
    pub fn task_failed(&mut self, error: String) {
        self.is_loading = false;
        self.set_error(error);
    }

    pub fn refresh_failed(&mut self, generation: u64, error: String) {
        if self.is_current(generation) {
            self.is_loading = false;
            self.set_error(error);
        }
    }

    pub fn reconcile(&mut self) {
        self.visible = selection::reconcile_selection(&self.jobs, self.selection.as_ref())
            .into_iter()
            .cloned()
            .collect();
        if self.cursor >= self.visible.len() {
            self.cursor = self.visible.len().saturating_sub(1);
        }
    }

    pub fn visible_job_ids(&self) -> Vec<String> {
        self.visible.iter().map(|j| j.job_id.clone()).collect()
    }

    /// `Some(Some(run))` loaded, `Some(None)` never ran or fetch failed, `None` not yet loaded.
    pub fn last_run_for(&self, job_id: &str) -> Option<Option<&Run>> {
        self.last_runs.get(job_id).map(Option::as_ref)
    }

    pub fn current_job(&self) -> Option<&Job> {
        self.visible.get(self.cursor)
    }

    pub fn is_filtered(&self) -> bool {
        self.visible.len() < self.jobs.len()
    }

    // --- Card grid navigation ---

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor + 1 < self.visible.len() {
            self.cursor += 1;
        }
    }

    pub fn move_up(&mut self) {
        let cols = self.columns.max(1);
        if self.cursor >= cols {
            self.cursor -= cols;
        }
    }

    pub fn move_down(&mut self) {
        let cols = self.columns.max(1);
        if self.cursor + cols < self.visible.len() {
            self.cursor += cols;
        }
    }

    // --- Selection overlay ---

    pub fn has_select_overlay(&self) -> bool {
        matches!(self.overlay, ActiveOverlay::Select(_))
    }

    pub fn open_select_overlay(&mut self) {
        self.overlay = ActiveOverlay::Select(SelectionDraft::open(
            &self.jobs,
            self.selection.as_ref(),
        ));
    }

    pub fn draft_mut(&mut self) -> Option<&mut SelectionDraft> {
        match self.overlay {
            ActiveOverlay::Select(ref mut draft) => Some(draft),
            _ => None,
        }
    }

    /// Commits the draft and returns the new map for persisting, or `None` if the
    /// overlay wasn't open.
    pub fn apply_selection(&mut self) -> Option<SelectionMap> {
        if !self.has_select_overlay() {
            return None;
        }
        let ActiveOverlay::Select(draft) = std::mem::replace(&mut self.overlay, ActiveOverlay::None)
        else {
            return None;
        };
        let committed = draft.commit();
        self.selection = Some(committed.clone());
        self.cursor = 0;
        self.reconcile();
        Some(committed)
    }

    pub fn cancel_selection(&mut self) {
        if self.has_select_overlay() {
            self.overlay = ActiveOverlay::None;
        }
    }

    // --- Runs overlay ---

    pub fn has_runs_overlay(&self) -> bool {
        matches!(self.overlay, ActiveOverlay::Runs(_))
    }

    /// Opens the runs table for the job under the cursor and returns its id for fetching.
    pub fn open_runs_overlay(&mut self) -> Option<String> {
        let job = self.current_job()?;
        let view = RunsView {
            job_id: job.job_id.clone(),
            job_name: job.display_name(),
            runs: Vec::new(),
            loaded: false,
            cursor: 0,
        };
        let job_id = view.job_id.clone();
        self.overlay = ActiveOverlay::Runs(view);
        Some(job_id)
    }

    pub fn runs_view(&self) -> Option<&RunsView> {
        match self.overlay {
            ActiveOverlay::Runs(ref view) => Some(view),
            _ => None,
        }
    }

    fn runs_view_mut(&mut self) -> Option<&mut RunsView> {
        match self.overlay {
            ActiveOverlay::Runs(ref mut view) => Some(view),
            _ => None,
        }
    }

    /// Fills the runs table if it is still showing `job_id`.
    pub fn apply_runs(&mut self, job_id: &str, runs: Vec<Run>) -> bool {
        match self.runs_view_mut() {
            Some(view) if view.job_id == job_id => {
                view.runs = runs;
                view.loaded = true;
                if view.cursor >= view.runs.len() {
                    view.cursor = view.runs.len().saturating_sub(1);
                }
                true
            }
            _ => false,
        }
    }

    pub fn reload_runs(&mut self) -> Option<String> {
        let view = self.runs_view_mut()?;
        view.loaded = false;
        Some(view.job_id.clone())
    }

    pub fn runs_cursor_up(&mut self) {
        if let Some(view) = self.runs_view_mut() {
            view.cursor = view.cursor.saturating_sub(1);
        }
    }

    pub fn runs_cursor_down(&mut self) {
        if let Some(view) = self.runs_view_mut() {
            if view.cursor + 1 < view.runs.len() {
                view.cursor += 1;
            }
        }
    }

    pub fn current_run_url(&self) -> Option<&str> {
        let view = self.runs_view()?;
        view.runs.get(view.cursor)?.run_page_url.as_deref()
    }

    pub fn close_overlay(&mut self) {
        self.overlay = ActiveOverlay::None;
    }

    // --- Transient UI ---

    pub fn notify(&mut self, message: String) {
        self.notifications.push(Notification {
            message,
            timestamp: Instant::now(),
        });
    }

    pub fn prune_notifications(&mut self) {
        let now = Instant::now();
        self.notifications
            .retain(|n| now.duration_since(n.timestamp).as_secs() < NOTIFICATION_TTL_SECS);
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
    }

    pub fn set_error(&mut self, msg: String) {
        self.error = Some((msg, Instant::now()));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn prune_error(&mut self) {
        if let Some((_, ts)) = &self.error {
            if ts.elapsed().as_secs() >= ERROR_TTL_SECS {
                self.error = None;
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LifecycleState;
    use pretty_assertions::assert_eq;

    fn config() -> AppConfig {
        AppConfig {
            environment: "dev".to_string(),
            host: "https://example.com".to_string(),
            max_in_flight: 8,
        }
    }

    fn jobs(n: usize) -> Vec<Job> {
        (1..=n)
            .map(|i| Job::new(i.to_string(), Some(format!("Job {i}").as_str())))
            .collect()
    }

    fn run(job_id: &str, url: Option<&str>) -> Run {
        Run {
            run_id: format!("r{job_id}"),
            job_id: job_id.to_string(),
            run_name: None,
            start_time: Some(1000),
            end_time: Some(2000),
            lifecycle_state: LifecycleState::Terminated,
            result_state: None,
            state_message: None,
            run_page_url: url.map(str::to_string),
        }
    }

    fn loaded_state(n: usize) -> AppState {
        let mut state = AppState::new(config(), None);
        let generation = state.begin_refresh();
        state.apply_jobs(generation, jobs(n));
        state
    }

    #[test]
    fn apply_jobs_returns_visible_ids() {
        let mut state = AppState::new(config(), None);
        let generation = state.begin_refresh();
        let ids = state.apply_jobs(generation, jobs(3)).unwrap();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(state.is_loading);
    }

    #[test]
    fn stale_job_list_is_dropped() {
        let mut state = AppState::new(config(), None);
        let old = state.begin_refresh();
        let new = state.begin_refresh();
        assert!(state.apply_jobs(old, jobs(5)).is_none());
        assert!(state.jobs.is_empty());
        assert!(state.apply_jobs(new, jobs(2)).is_some());
        assert_eq!(state.jobs.len(), 2);
    }

    #[test]
    fn stale_last_runs_are_not_merged() {
        let mut state = loaded_state(2);
        let current = state.generation;
        let mut fresh = HashMap::new();
        fresh.insert("1".to_string(), Some(run("1", None)));
        assert!(state.apply_last_runs(current, fresh));
        assert!(!state.is_loading);

        let newer = state.begin_refresh();
        let mut stale = HashMap::new();
        stale.insert("2".to_string(), Some(run("2", None)));
        assert!(!state.apply_last_runs(newer - 1, stale));
        assert!(state.last_runs.contains_key("1"));
        assert!(!state.last_runs.contains_key("2"));
        assert!(state.is_loading);
    }

    #[test]
    fn refresh_failure_only_reported_for_current_generation() {
        let mut state = AppState::new(config(), None);
        let old = state.begin_refresh();
        state.begin_refresh();
        state.refresh_failed(old, "boom".to_string());
        assert!(state.error_message().is_none());
        assert!(state.is_loading);
        state.refresh_failed(state.generation, "boom".to_string());
        assert_eq!(state.error_message(), Some("boom"));
        assert!(!state.is_loading);
    }

    #[test]
    fn persisted_selection_filters_grid() {
        let selection: SelectionMap = [("2", true)].into_iter().collect();
        let mut state = AppState::new(config(), Some(selection));
        let generation = state.begin_refresh();
        let ids = state.apply_jobs(generation, jobs(3)).unwrap();
        assert_eq!(ids, vec!["2"]);
        assert!(state.is_filtered());
    }

    #[test]
    fn last_run_lookup_states() {
        let mut state = loaded_state(2);
        let mut map = HashMap::new();
        map.insert("1".to_string(), Some(run("1", None)));
        map.insert("2".to_string(), None);
        state.apply_last_runs(state.generation, map);
        assert!(matches!(state.last_run_for("1"), Some(Some(_))));
        assert!(matches!(state.last_run_for("2"), Some(None)));
        assert!(state.last_run_for("3").is_none());
    }

    #[test]
    fn grid_navigation_by_columns() {
        let mut state = loaded_state(7);
        state.columns = 3;
        state.move_down();
        assert_eq!(state.cursor, 3);
        state.move_down();
        assert_eq!(state.cursor, 6);
        state.move_down();
        assert_eq!(state.cursor, 6);
        state.move_right();
        assert_eq!(state.cursor, 6);
        state.move_up();
        assert_eq!(state.cursor, 3);
        state.move_left();
        assert_eq!(state.cursor, 2);
    }

    #[test]
    fn grid_navigation_on_empty_state() {
        let mut state = AppState::new(config(), None);
        state.move_down();
        state.move_right();
        state.move_up();
        state.move_left();
        assert_eq!(state.cursor, 0);
        assert!(state.current_job().is_none());
    }

    #[test]
    fn cursor_clamped_when_grid_shrinks() {
        let mut state = loaded_state(5);
        state.cursor = 4;
        let generation = state.begin_refresh();
        state.apply_jobs(generation, jobs(2));
        assert_eq!(state.cursor, 1);
    }

    #[test]
    fn apply_selection_commits_and_reconciles() {
        let mut state = loaded_state(3);
        state.open_select_overlay();
        state.draft_mut().unwrap().toggle("3");
        let committed = state.apply_selection().unwrap();
        assert!(committed.is_selected("3"));
        assert_eq!(state.visible_job_ids(), vec!["3"]);
        assert!(!state.has_select_overlay());
    }

    #[test]
    fn cancel_selection_discards_draft() {
        let mut state = loaded_state(3);
        state.open_select_overlay();
        state.draft_mut().unwrap().toggle("3");
        state.cancel_selection();
        assert!(state.selection.is_none());
        assert_eq!(state.visible.len(), 3);
    }

    #[test]
    fn clearing_everything_shows_all() {
        let mut state = loaded_state(3);
        state.open_select_overlay();
        state.draft_mut().unwrap().set_all(false);
        state.apply_selection();
        assert_eq!(state.visible.len(), 3);
    }

    #[test]
    fn selection_refresh_fetches_last_runs_when_jobs_current() {
        let mut state = loaded_state(3);
        state.apply_last_runs(state.generation, HashMap::new());
        state.open_select_overlay();
        state.draft_mut().unwrap().toggle("2");
        state.apply_selection();
        let before = state.generation;
        assert_eq!(
            state.begin_selection_refresh(),
            SelectionRefresh::LastRuns(before + 1, vec!["2".to_string()])
        );
    }

    #[test]
    fn selection_during_refresh_keeps_requested_job_list() {
        let mut state = loaded_state(2);
        state.apply_last_runs(state.generation, HashMap::new());

        // User refreshes, then applies a selection before the job list arrives
        state.begin_refresh();
        state.open_select_overlay();
        state.draft_mut().unwrap().toggle("1");
        state.apply_selection();
        let SelectionRefresh::Full(generation) = state.begin_selection_refresh() else {
            panic!("pending job list must be refetched");
        };

        let ids = state.apply_jobs(generation, jobs(3)).unwrap();
        assert_eq!(state.jobs.len(), 3);
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn task_failure_stops_loading() {
        let mut state = AppState::new(config(), None);
        state.begin_refresh();
        state.task_failed("refresh crashed: boom".to_string());
        assert!(!state.is_loading);
        assert_eq!(state.error_message(), Some("refresh crashed: boom"));
    }

    #[test]
    fn apply_selection_without_overlay_is_noop() {
        let mut state = loaded_state(2);
        assert!(state.apply_selection().is_none());
        assert!(state.selection.is_none());
    }

    #[test]
    fn runs_overlay_lifecycle() {
        let mut state = loaded_state(2);
        state.move_right();
        assert_eq!(state.open_runs_overlay().as_deref(), Some("2"));
        assert_eq!(state.runs_view().unwrap().job_name, "Job 2");

        assert!(!state.apply_runs("1", vec![run("1", None)]));
        assert!(state.apply_runs("2", vec![run("2", Some("https://x/run/1")), run("2", None)]));
        let view = state.runs_view().unwrap();
        assert!(view.loaded);
        assert_eq!(view.runs.len(), 2);
        assert_eq!(state.current_run_url(), Some("https://x/run/1"));

        state.runs_cursor_down();
        assert_eq!(state.current_run_url(), None);
        state.runs_cursor_down();
        assert_eq!(state.runs_view().unwrap().cursor, 1);

        state.close_overlay();
        assert!(!state.apply_runs("2", Vec::new()));
    }

    #[test]
    fn reload_runs_marks_unloaded() {
        let mut state = loaded_state(1);
        state.open_runs_overlay();
        state.apply_runs("1", vec![run("1", None)]);
        assert_eq!(state.reload_runs().as_deref(), Some("1"));
        assert!(!state.runs_view().unwrap().loaded);
    }

    #[test]
    fn error_lifecycle() {
        let mut state = AppState::new(config(), None);
        state.set_error("oops".to_string());
        assert_eq!(state.error_message(), Some("oops"));
        state.prune_error();
        assert!(state.error_message().is_some());
        state.clear_error();
        assert!(state.error_message().is_none());
    }

    #[test]
    fn spinner_wraps() {
        let mut state = AppState::new(config(), None);
        for _ in 0..SPINNER_FRAME_COUNT {
            state.advance_spinner();
        }
        assert_eq!(state.spinner_frame, 0);
    }
}
