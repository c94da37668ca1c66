//! Background fetch tasks.
//!
//! Every refresh carries a generation number chosen by the main loop. Tasks echo it back
//! in their events and the main loop drops anything older than its current generation,
//! so a slow response from a superseded refresh never lands on top of a newer one.
//!
//! Last-run lookups for the card grid fan out with at most `max_in_flight` requests in
//! flight. Each job fails independently: a failed lookup is logged and recorded as
//! `None`, which the grid renders as a placeholder card.

use crate::events::AppEvent;
use crate::model::Run;
use crate::traits::JobsApi;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time;

pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;
const RETRY_DELAY: time::Duration = time::Duration::from_secs(2);

/// Sends [`AppEvent::AutoRefresh`] on a fixed interval until the receiver goes away.
pub struct Poller {
    interval: time::Duration,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl Poller {
    pub fn new(interval: time::Duration, tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { interval, tx }
    }

    pub async fn run(self) {
        loop {
            time::sleep(self.interval).await;
            if self.tx.send(AppEvent::AutoRefresh).is_err() {
                return;
            }
        }
    }
}

pub async fn fetch_jobs(
    api: Arc<dyn JobsApi>,
    generation: u64,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    let event = match api.list_jobs().await {
        Ok(jobs) => {
            tracing::info!("generation {generation}: listed {} jobs", jobs.len());
            AppEvent::JobsLoaded { generation, jobs }
        }
        Err(e) => {
            tracing::warn!("generation {generation}: failed to list jobs: {e}");
            AppEvent::RefreshFailed {
                generation,
                error: format!("Failed to list jobs: {e}"),
            }
        }
    };
    if tx.send(event).is_err() {
        tracing::warn!("fetch_jobs: channel closed");
    }
}

/// Last run for each job, `max_in_flight` requests at a time.
pub async fn fetch_last_runs(
    api: &dyn JobsApi,
    job_ids: &[String],
    max_in_flight: usize,
) -> HashMap<String, Option<Run>> {
    stream::iter(job_ids.to_vec())
        .map(|job_id: String| async move {
            let run = match api.get_last_run(&job_id).await {
                Ok(run) => run,
                Err(e) => {
                    tracing::warn!("failed to fetch last run for job {job_id}: {e}");
                    None
                }
            };
            (job_id, run)
        })
        .buffer_unordered(max_in_flight.max(1))
        .collect()
        .await
}

pub async fn send_last_runs(
    api: Arc<dyn JobsApi>,
    generation: u64,
    job_ids: Vec<String>,
    max_in_flight: usize,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    let last_runs = fetch_last_runs(api.as_ref(), &job_ids, max_in_flight).await;
    tracing::debug!("generation {generation}: fetched last runs for {} jobs", last_runs.len());
    if tx
        .send(AppEvent::LastRunsLoaded {
            generation,
            last_runs,
        })
        .is_err()
    {
        tracing::warn!("send_last_runs: channel closed");
    }
}

/// Full run history for one job. Retries once, then degrades to an empty list.
pub async fn fetch_runs_soft(api: &dyn JobsApi, job_id: &str) -> Vec<Run> {
    match api.list_runs(job_id).await {
        Ok(runs) => runs,
        Err(first_err) => {
            time::sleep(RETRY_DELAY).await;
            match api.list_runs(job_id).await {
                Ok(runs) => runs,
                Err(retry_err) => {
                    tracing::warn!(
                        "failed to list runs for job {job_id}: {first_err} \
                         (retry also failed: {retry_err})"
                    );
                    Vec::new()
                }
            }
        }
    }
}

pub async fn fetch_runs_for_job(
    api: Arc<dyn JobsApi>,
    job_id: String,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    let runs = fetch_runs_soft(api.as_ref(), &job_id).await;
    if tx.send(AppEvent::RunsLoaded { job_id, runs }).is_err() {
        tracing::warn!("fetch_runs_for_job: channel closed");
    }
}
