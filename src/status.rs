//! Display state for a job's run.
//!
//! [`derive_display_state`] turns a raw [`Run`] plus the current instant into everything
//! the card grid and runs table need: formatted start time, human duration, colors and
//! which of the two state labels is emphasised. The result depends on `now` for active
//! runs, so it is computed on every render and never stored.

use crate::model::{LifecycleState, ResultState, Run};
use chrono::{DateTime, Local, TimeZone, Utc};

pub const NOT_AVAILABLE: &str = "N/A";

const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Green,
    Red,
    /// Accent for runs still in progress.
    Amber,
    Gray,
    /// Plain foreground text.
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDisplayState {
    pub lifecycle_label: String,
    pub result_label: String,
    pub formatted_start_time: String,
    pub formatted_duration: String,
    pub result_color: StatusColor,
    pub lifecycle_color: StatusColor,
    pub lifecycle_font_weight: FontWeight,
    pub result_font_weight: FontWeight,
}

impl RunDisplayState {
    /// Placeholder for a job that has never run or whose last run could not be fetched.
    pub fn placeholder() -> Self {
        Self {
            lifecycle_label: NOT_AVAILABLE.to_string(),
            result_label: NOT_AVAILABLE.to_string(),
            formatted_start_time: NOT_AVAILABLE.to_string(),
            formatted_duration: NOT_AVAILABLE.to_string(),
            result_color: StatusColor::Gray,
            lifecycle_color: StatusColor::Gray,
            lifecycle_font_weight: FontWeight::Normal,
            result_font_weight: FontWeight::Normal,
        }
    }
}

pub fn derive_display_state(run: Option<&Run>, now: DateTime<Utc>) -> RunDisplayState {
    let Some(run) = run else {
        return RunDisplayState::placeholder();
    };

    let active = run.lifecycle_state.is_active();
    let (lifecycle_font_weight, result_font_weight) = if active {
        (FontWeight::Bold, FontWeight::Normal)
    } else {
        (FontWeight::Normal, FontWeight::Bold)
    };

    RunDisplayState {
        lifecycle_label: run.lifecycle_state.as_str().to_string(),
        result_label: run
            .result_state
            .map_or(NOT_AVAILABLE, ResultState::as_str)
            .to_string(),
        formatted_start_time: run
            .start_time
            .map_or_else(|| NOT_AVAILABLE.to_string(), format_start_time),
        formatted_duration: duration_secs(run, now)
            .map_or_else(|| NOT_AVAILABLE.to_string(), format_duration),
        result_color: result_color(run.lifecycle_state, run.result_state),
        lifecycle_color: if run.lifecycle_state == LifecycleState::Running {
            StatusColor::Amber
        } else {
            StatusColor::Black
        },
        lifecycle_font_weight,
        result_font_weight,
    }
}

/// Result checks take precedence over the running accent.
pub fn result_color(lifecycle: LifecycleState, result: Option<ResultState>) -> StatusColor {
    match (result, lifecycle) {
        (Some(ResultState::Success), _) => StatusColor::Green,
        (Some(ResultState::Failed | ResultState::MaximumConcurrentRunsReached), _) => {
            StatusColor::Red
        }
        (_, LifecycleState::Running) => StatusColor::Amber,
        _ => StatusColor::Gray,
    }
}

/// Whole seconds the run has taken so far (active) or in total (finished).
pub fn duration_secs(run: &Run, now: DateTime<Utc>) -> Option<i64> {
    let start = run.start_time?;
    if run.lifecycle_state.is_active() {
        return Some(((now.timestamp_millis() - start) / 1000).max(0));
    }
    let end = run.end_time?;
    Some((end - start).div_euclid(1000))
}

pub fn format_duration(secs: i64) -> String {
    if secs == 1 {
        "1 second".to_string()
    } else {
        format!("{secs} seconds")
    }
}

pub fn format_start_time(epoch_ms: i64) -> String {
    format_start_time_in(epoch_ms, &Local)
}

pub fn format_start_time_in<Tz>(epoch_ms: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match tz.timestamp_millis_opt(epoch_ms).single() {
        Some(dt) => dt.format(START_TIME_FORMAT).to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}
