#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Pending,
    Queued,
    Running,
    Terminating,
    Terminated,
    Skipped,
    InternalError,
    Blocked,
    WaitingForRetry,
    #[serde(other)]
    Unknown,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Terminating => "TERMINATING",
            Self::Terminated => "TERMINATED",
            Self::Skipped => "SKIPPED",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Blocked => "BLOCKED",
            Self::WaitingForRetry => "WAITING_FOR_RETRY",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Pending or running: the run has no end time yet and its result is not meaningful.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultState {
    Success,
    Failed,
    Timedout,
    Canceled,
    MaximumConcurrentRunsReached,
    Excluded,
    SuccessWithFailures,
    UpstreamFailed,
    UpstreamCanceled,
    #[serde(other)]
    Unknown,
}

impl ResultState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Timedout => "TIMEDOUT",
            Self::Canceled => "CANCELED",
            Self::MaximumConcurrentRunsReached => "MAXIMUM_CONCURRENT_RUNS_REACHED",
            Self::Excluded => "EXCLUDED",
            Self::SuccessWithFailures => "SUCCESS_WITH_FAILURES",
            Self::UpstreamFailed => "UPSTREAM_FAILED",
            Self::UpstreamCanceled => "UPSTREAM_CANCELED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Label short enough for a table column.
    pub fn short_label(self) -> &'static str {
        match self {
            Self::MaximumConcurrentRunsReached => "MAX_CONC_RUNS",
            other => other.as_str(),
        }
    }
}

/// A job as listed by the remote service. Read-only, re-fetched on every refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub job_id: String,
    pub name: Option<String>,
}

impl Job {
    pub fn new(job_id: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            job_id: job_id.into(),
            name: name.map(str::to_string),
        }
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("Job ID: {}", self.job_id),
        }
    }
}

/// One execution of a job. Times are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub run_id: String,
    pub job_id: String,
    pub run_name: Option<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub lifecycle_state: LifecycleState,
    pub result_state: Option<ResultState>,
    pub state_message: Option<String>,
    pub run_page_url: Option<String>,
}
