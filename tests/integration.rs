
use fixtures::*;
use dbw::api::parser;
use dbw::app::AppState;
use dbw::input::{self, Action, InputContext, OverlayMode};
use dbw::model::{LifecycleState, ResultState};
use dbw::selection::{self, SelectionMap};
use dbw::status::{self, FontWeight, StatusColor};
use dbw::store::SelectionStore;

use chrono::{TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use pretty_assertions::assert_eq;
use std::collections::HashMap;

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    }
}

fn at(ms: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

// ========== Data flow ==========

#[test]
fn full_flow_json_to_state_to_display() {
    let jobs = parser::parse_jobs(JOBS_JSON).unwrap();
    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[0].job_id, "1");
    assert_eq!(jobs[2].display_name(), "Nightly ETL Load");

    let mut state = AppState::new(config(), None);
    let generation = state.begin_refresh();
    let ids = state.apply_jobs(generation, jobs).unwrap();
    assert_eq!(ids, vec!["1", "2", "3"]);

    let mut last_runs = HashMap::new();
    let runs = parser::parse_runs(&last_run_json(1, 11, "RUNNING", None)).unwrap();
    last_runs.insert("1".to_string(), runs.into_iter().next());
    let runs =
        parser::parse_runs(&last_run_json(2, 21, "TERMINATED", Some("FAILED"))).unwrap();
    last_runs.insert("2".to_string(), runs.into_iter().next());
    last_runs.insert("3".to_string(), None);
    assert!(state.apply_last_runs(generation, last_runs));
    assert!(!state.is_loading);

    let now = at(T + 42_000);

    let running = status::derive_display_state(state.last_run_for("1").unwrap(), now);
    assert_eq!(running.lifecycle_label, "RUNNING");
    assert_eq!(running.formatted_duration, "42 seconds");
    assert_eq!(running.result_color, StatusColor::Amber);

    // end_time 0 means the run has not ended; a terminated run without one has no duration
    let failed = status::derive_display_state(state.last_run_for("2").unwrap(), now);
    assert_eq!(failed.result_label, "FAILED");
    assert_eq!(failed.result_color, StatusColor::Red);
    assert_eq!(failed.formatted_duration, status::NOT_AVAILABLE);

    let never_ran = status::derive_display_state(state.last_run_for("3").unwrap(), now);
    assert_eq!(never_ran, status::RunDisplayState::placeholder());
}

#[test]
fn two_job_selection_scenario() {
    let jobs = vec![job("1", "A"), job("2", "B")];
    let selection: SelectionMap = [("1", true), ("2", false)].into_iter().collect();
    let view = selection::reconcile_selection(&jobs, Some(&selection));
    assert_eq!(view, vec![&jobs[0]]);
}

#[test]
fn completed_success_scenario() {
    let run = completed_run("1", ResultState::Success, 125_000);
    let display = status::derive_display_state(Some(&run), at(T + 999_999));
    assert_eq!(display.formatted_duration, "125 seconds");
    assert_eq!(display.result_color, StatusColor::Green);
    assert_eq!(display.result_font_weight, FontWeight::Bold);
    assert_eq!(display.lifecycle_font_weight, FontWeight::Normal);
}

#[test]
fn running_scenario() {
    let run = running_run("1");
    let display = status::derive_display_state(Some(&run), at(T + 5000));
    assert_eq!(display.formatted_duration, "5 seconds");
    assert_eq!(display.result_color, StatusColor::Amber);
    assert_eq!(display.lifecycle_font_weight, FontWeight::Bold);
    assert_eq!(display.result_font_weight, FontWeight::Normal);
}

#[test]
fn concurrency_limit_is_red_with_short_label() {
    let run = completed_run("1", ResultState::MaximumConcurrentRunsReached, 0);
    let display = status::derive_display_state(Some(&run), at(T));
    assert_eq!(display.result_color, StatusColor::Red);
    assert_eq!(display.formatted_duration, "0 seconds");
    assert_eq!(ResultState::MaximumConcurrentRunsReached.short_label(), "MAX_CONC_RUNS");
}

#[test]
fn parsed_run_page_url_reaches_runs_table() {
    let mut state = loaded_state(parser::parse_jobs(JOBS_JSON).unwrap());
    state.move_right();
    let job_id = state.open_runs_overlay().unwrap();
    assert_eq!(job_id, "2");
    let runs = parser::parse_runs(&last_run_json(2, 21, "PENDING", None)).unwrap();
    assert_eq!(runs[0].lifecycle_state, LifecycleState::Pending);
    assert!(state.apply_runs(&job_id, runs));
    assert_eq!(
        state.current_run_url(),
        Some("https://dbc-1.cloud.databricks.com/#job/2/run/21")
    );
}

// ========== Refresh generations ==========

#[test]
fn slow_refresh_never_overwrites_newer_one() {
    let mut state = AppState::new(config(), None);
    let first = state.begin_refresh();
    let second = state.begin_refresh();

    assert!(state.apply_jobs(second, vec![job("1", "A")]).is_some());
    let mut fresh = HashMap::new();
    fresh.insert("1".to_string(), Some(completed_run("1", ResultState::Success, 1000)));
    assert!(state.apply_last_runs(second, fresh));

    // First refresh finally answers
    assert!(state
        .apply_jobs(first, vec![job("1", "A"), job("9", "Old")])
        .is_none());
    let mut stale = HashMap::new();
    stale.insert("9".to_string(), None);
    assert!(!state.apply_last_runs(first, stale));

    assert_eq!(state.jobs.len(), 1);
    assert!(state.last_run_for("9").is_none());
    assert!(matches!(state.last_run_for("1"), Some(Some(_))));
}

// ========== Selection flow ==========

#[test]
fn selection_survives_restart_via_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SelectionStore::in_dir(dir.path());

    let mut state = loaded_state(vec![job("1", "A"), job("2", "B"), job("3", "C")]);
    state.open_select_overlay();
    let draft = state.draft_mut().unwrap();
    draft.move_down();
    draft.toggle_current();
    let committed = state.apply_selection().unwrap();
    store.save(&committed).unwrap();
    assert_eq!(state.visible_job_ids(), vec!["2"]);

    // Next session
    let persisted = store.load().unwrap();
    let mut next = AppState::new(config(), persisted);
    let generation = next.begin_refresh();
    let ids = next
        .apply_jobs(generation, vec![job("1", "A"), job("2", "B"), job("3", "C")])
        .unwrap();
    assert_eq!(ids, vec!["2"]);
}

#[test]
fn selected_job_removed_upstream_falls_back_to_all() {
    let selection: SelectionMap = [("7", true)].into_iter().collect();
    let mut state = AppState::new(config(), Some(selection));
    let generation = state.begin_refresh();
    let ids = state
        .apply_jobs(generation, vec![job("1", "A"), job("2", "B")])
        .unwrap();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(!state.is_filtered());
}

#[test]
fn search_then_select_all_covers_hidden_rows() {
    let mut state = loaded_state(vec![
        job("1", "ETL Load"),
        job("2", "Nightly Report"),
        job("3", "etl backfill"),
    ]);
    state.open_select_overlay();
    let draft = state.draft_mut().unwrap();
    for c in "etl".chars() {
        draft.push_query(c);
    }
    assert_eq!(draft.visible_rows().len(), 2);
    draft.toggle_current();
    assert_eq!(draft.checked_count(), 1);
    draft.set_all(true);
    assert_eq!(draft.checked_count(), 3);
}

// ========== Key flows ==========

#[test]
fn key_sequence_for_selection_overlay() {
    let mut state = loaded_state(vec![job("1", "A"), job("2", "B")]);
    let grid = InputContext::default();
    assert_eq!(input::map_key(press(KeyCode::Char('s')), &grid), Action::OpenSelection);
    state.open_select_overlay();

    let select = InputContext {
        overlay: OverlayMode::Select,
        ..Default::default()
    };
    assert_eq!(input::map_key(press(KeyCode::Char('/')), &select), Action::FocusSearch);

    let search = InputContext {
        overlay: OverlayMode::Search,
        ..Default::default()
    };
    // 'q' is text while searching, not quit
    assert_eq!(
        input::map_key(press(KeyCode::Char('q')), &search),
        Action::SearchInput('q')
    );
    assert_eq!(input::map_key(press(KeyCode::Esc), &search), Action::LeaveSearch);
    assert_eq!(input::map_key(press(KeyCode::Esc), &select), Action::CloseOverlay);

    state.cancel_selection();
    assert!(state.selection.is_none());
}

#[test]
fn esc_dismisses_error_before_quitting() {
    let mut state = loaded_state(vec![job("1", "A")]);
    state.set_error("HTTP 403: invalid token".to_string());
    let ctx = InputContext {
        has_error: state.error.is_some(),
        ..Default::default()
    };
    assert_eq!(input::map_key(press(KeyCode::Esc), &ctx), Action::DismissError);
    state.clear_error();
    let ctx = InputContext {
        has_error: state.error.is_some(),
        ..Default::default()
    };
    assert_eq!(input::map_key(press(KeyCode::Esc), &ctx), Action::Quit);
}
