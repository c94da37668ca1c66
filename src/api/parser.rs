//! Decoding of the jobs API 2.0 list responses into [`Job`] and [`Run`].

use crate::api::ApiError;
use crate::model::{Job, LifecycleState, ResultState, Run};

/// Ids arrive as integers but are treated as opaque strings.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum WireId {
    Int(i64),
    Str(String),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Int(n) => n.to_string(),
            WireId::Str(s) => s,
        }
    }
}

#[derive(serde::Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<WireJob>,
}

#[derive(serde::Deserialize)]
struct WireJob {
    job_id: WireId,
    #[serde(default)]
    settings: Option<WireJobSettings>,
}

#[derive(serde::Deserialize)]
struct WireJobSettings {
    name: Option<String>,
}

#[derive(serde::Deserialize)]
struct RunsResponse {
    #[serde(default)]
    runs: Vec<WireRun>,
}

#[derive(serde::Deserialize)]
struct WireRun {
    run_id: WireId,
    job_id: WireId,
    run_name: Option<String>,
    start_time: Option<i64>,
    end_time: Option<i64>,
    state: WireRunState,
    run_page_url: Option<String>,
}

#[derive(serde::Deserialize)]
struct WireRunState {
    life_cycle_state: LifecycleState,
    result_state: Option<ResultState>,
    state_message: Option<String>,
}

/// The API reports unset times as 0.
fn epoch_ms(raw: Option<i64>) -> Option<i64> {
    raw.filter(|ms| *ms > 0)
}

pub fn parse_jobs(json: &str) -> Result<Vec<Job>, ApiError> {
    let resp: JobsResponse = serde_json::from_str(json)?;
    Ok(resp
        .jobs
        .into_iter()
        .map(|job| Job {
            job_id: job.job_id.into(),
            name: job
                .settings
                .and_then(|s| s.name)
                .filter(|n| !n.is_empty()),
        })
        .collect())
}

pub fn parse_runs(json: &str) -> Result<Vec<Run>, ApiError> {
    let resp: RunsResponse = serde_json::from_str(json)?;
    Ok(resp
        .runs
        .into_iter()
        .map(|run| Run {
            run_id: run.run_id.into(),
            job_id: run.job_id.into(),
            run_name: run.run_name,
            start_time: epoch_ms(run.start_time),
            end_time: epoch_ms(run.end_time),
            lifecycle_state: run.state.life_cycle_state,
            result_state: run.state.result_state,
            state_message: run.state.state_message.filter(|m| !m.is_empty()),
            run_page_url: run.run_page_url,
        })
        .collect())
}
