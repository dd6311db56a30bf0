//! Execution backend abstraction.
//!
//! Dispatch is fire-and-forget: the orchestrator submits a job, the backend
//! acknowledges, and no further interaction happens in-process. Build
//! progress is observable only through the log stream.

mod http;

pub use http::HttpExecutor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use loft_core::DeployJob;

use crate::error::ControlResult;

/// Acknowledgement returned by the execution backend on submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobHandle {
    /// Backend-assigned job identifier, if the backend reports one.
    #[serde(default)]
    pub id: Option<String>,
}

/// An isolated build-execution backend.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Submit a job for execution.
    ///
    /// One outbound call, no retry. Returns as soon as the backend
    /// acknowledges the submission — never waits for the build itself.
    async fn submit(&self, job: &DeployJob) -> ControlResult<JobHandle>;
}
