use crate::api::ApiError;
use crate::model::{Job, Run};
use async_trait::async_trait;

#[async_trait]
pub trait JobsApi: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError>;
    async fn list_runs(&self, job_id: &str) -> Result<Vec<Run>, ApiError>;
    /// Most recent run only, or `None` if the job has never run.
    async fn get_last_run(&self, job_id: &str) -> Result<Option<Run>, ApiError>;
}
