//! HTTP execution backend.
//!
//! Submits jobs to the builder service by POSTing the job environment to a
//! configured endpoint. The builder launches an isolated build container
//! with exactly that environment.

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use loft_core::DeployJob;

use crate::config::ExecutorConfig;
use crate::error::{ControlError, ControlResult};

use super::{ExecutionBackend, JobHandle};

/// Execution backend that talks to the builder service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    endpoint: String,
}

impl HttpExecutor {
    /// Create an executor from configuration.
    pub fn new(config: &ExecutorConfig) -> ControlResult<Self> {
        let client = Client::builder()
            .timeout(config.submit_timeout())
            .build()
            .map_err(ControlError::Http)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl ExecutionBackend for HttpExecutor {
    async fn submit(&self, job: &DeployJob) -> ControlResult<JobHandle> {
        let body = serde_json::json!({
            "environment": job.environment(),
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ControlError::DispatchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ControlError::BackendRejected(format!(
                "submission returned {status}"
            )));
        }

        // The acknowledgement body is optional; an empty or opaque body
        // still counts as a successful submission.
        let handle = response.json::<JobHandle>().await.unwrap_or_default();

        info!(
            project_id = %job.project_id,
            job_id = handle.id.as_deref().unwrap_or("-"),
            "build job submitted"
        );

        Ok(handle)
    }
}
