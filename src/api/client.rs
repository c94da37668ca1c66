use crate::api::{parser, ApiError};
use crate::config::ApiConfig;
use crate::model::{Job, Run};
use crate::traits::JobsApi;
use async_trait::async_trait;
use reqwest::Client;

const JOBS_LIST_PATH: &str = "/api/2.0/jobs/list";
const RUNS_LIST_PATH: &str = "/api/2.0/jobs/runs/list";

/// Read-only client for the jobs API, authenticated with a static bearer token.
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &ApiConfig) -> Self {
        Self {
            client,
            base_url: config.host.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {url} {query:?}");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                code: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl JobsApi for ApiClient {
    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        let body = self.get(JOBS_LIST_PATH, &[]).await?;
        parser::parse_jobs(&body)
    }

    async fn list_runs(&self, job_id: &str) -> Result<Vec<Run>, ApiError> {
        let body = self
            .get(RUNS_LIST_PATH, &[("job_id", job_id.to_string())])
            .await?;
        parser::parse_runs(&body)
    }

    async fn get_last_run(&self, job_id: &str) -> Result<Option<Run>, ApiError> {
        let body = self
            .get(
                RUNS_LIST_PATH,
                &[
                    ("job_id", job_id.to_string()),
                    ("active_only", "false".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(parser::parse_runs(&body)?.into_iter().next())
    }
}
