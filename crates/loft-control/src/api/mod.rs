//! HTTP API for the control plane.
//!
//! - `POST /deployments` — submit a repository for deployment; responds as
//!   soon as the build job is dispatched, never waits for the build.
//! - `GET /logs` — WebSocket endpoint for live build-log observation.
//! - `GET /health` — liveness.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use loft_core::{DeployJob, ProjectId};

use crate::config::PreviewConfig;
use crate::dispatch::ExecutionBackend;
use crate::error::{ControlError, ControlResult};
use crate::relay::Rooms;

/// Shared application state for the control plane.
pub struct AppState {
    /// Execution backend for build jobs.
    pub executor: Arc<dyn ExecutionBackend>,
    /// Observer registrations for the log relay.
    pub rooms: Arc<Rooms>,
    /// Preview URL settings.
    pub preview: PreviewConfig,
}

/// Creates the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/deployments", post(create_deployment))
        .route("/logs", get(crate::relay::ws::logs_ws))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy"
    }))
}

/// Request to deploy a repository.
#[derive(Debug, Deserialize)]
pub struct CreateDeploymentRequest {
    /// Source repository URL.
    pub repo_url: String,
    /// Extra environment variables for the build.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Response for a queued deployment.
#[derive(Debug, Serialize)]
pub struct CreateDeploymentResponse {
    /// Always `"queued"` — the build has been dispatched, not completed.
    pub status: &'static str,
    /// Identifier and preview URL for the new deployment.
    pub data: DeploymentInfo,
}

/// Identifier and preview URL for a deployment.
#[derive(Debug, Serialize)]
pub struct DeploymentInfo {
    /// The allocated project identifier.
    pub project_id: String,
    /// Where the site will be served once the build finishes.
    pub url: String,
}

/// Submit a new deployment.
///
/// Allocates a fresh project identifier, dispatches the build job, and
/// responds immediately. A dispatch failure surfaces as an error response;
/// there is no local state to clean up.
async fn create_deployment(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDeploymentRequest>,
) -> Result<Json<CreateDeploymentResponse>, ControlError> {
    validate_repo_url(&request.repo_url)?;

    let project_id = ProjectId::generate();
    let job = DeployJob::new(project_id.clone(), request.repo_url.clone()).with_env(request.env);

    state.executor.submit(&job).await?;

    info!(
        project_id = %project_id,
        repo_url = %request.repo_url,
        "deployment queued"
    );

    Ok(Json(CreateDeploymentResponse {
        status: "queued",
        data: DeploymentInfo {
            url: state.preview.url_for(project_id.as_str()),
            project_id: project_id.to_string(),
        },
    }))
}

/// Validate that a string is a plausible repository locator.
///
/// Accepts absolute http(s)/git/ssh URLs and scp-like `git@host:path`
/// locators. Reachability is not checked.
pub fn validate_repo_url(raw: &str) -> ControlResult<()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ControlError::InvalidRepoUrl(
            "repository URL cannot be empty".into(),
        ));
    }

    if let Ok(parsed) = Url::parse(trimmed) {
        return match parsed.scheme() {
            "http" | "https" | "git" | "ssh" => {
                if parsed.host_str().is_some() {
                    Ok(())
                } else {
                    Err(ControlError::InvalidRepoUrl("missing host".into()))
                }
            }
            other => Err(ControlError::InvalidRepoUrl(format!(
                "unsupported scheme: {other}"
            ))),
        };
    }

    // scp-like syntax: user@host:path
    if let Some((user_host, path)) = trimmed.split_once(':') {
        if user_host.contains('@') && !path.is_empty() {
            return Ok(());
        }
    }

    Err(ControlError::InvalidRepoUrl(
        "not a recognised repository locator".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::JobHandle;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingExecutor {
        submitted: Mutex<Vec<DeployJob>>,
        fail: bool,
    }

    #[async_trait]
    impl ExecutionBackend for RecordingExecutor {
        async fn submit(&self, job: &DeployJob) -> ControlResult<JobHandle> {
            if self.fail {
                return Err(ControlError::DispatchFailed("backend unreachable".into()));
            }
            self.submitted.lock().unwrap().push(job.clone());
            Ok(JobHandle::default())
        }
    }

    fn test_router(executor: Arc<RecordingExecutor>) -> Router {
        let state = Arc::new(AppState {
            executor,
            rooms: Arc::new(Rooms::new()),
            preview: PreviewConfig::default(),
        });
        router(state)
    }

    fn deploy_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/deployments")
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[test]
    fn validate_accepts_common_locators() {
        assert!(validate_repo_url("https://github.com/acme/site.git").is_ok());
        assert!(validate_repo_url("http://git.internal/site").is_ok());
        assert!(validate_repo_url("git@github.com:acme/site.git").is_ok());
        assert!(validate_repo_url("ssh://git@github.com/acme/site.git").is_ok());
    }

    #[test]
    fn validate_rejects_bad_locators() {
        assert!(validate_repo_url("").is_err());
        assert!(validate_repo_url("   ").is_err());
        assert!(validate_repo_url("ftp://example.com/repo").is_err());
        assert!(validate_repo_url("not a url at all").is_err());
    }

    #[tokio::test]
    async fn deployment_is_queued_and_dispatched() {
        let executor = Arc::new(RecordingExecutor::default());
        let app = test_router(Arc::clone(&executor));

        let response = app
            .oneshot(deploy_request(
                r#"{"repo_url": "https://github.com/acme/site.git"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "queued");

        let project_id = json["data"]["project_id"].as_str().unwrap();
        assert!(!project_id.is_empty());
        assert!(json["data"]["url"]
            .as_str()
            .unwrap()
            .contains(project_id));

        let submitted = executor.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].project_id.as_str(), project_id);
        assert_eq!(submitted[0].repo_url, "https://github.com/acme/site.git");
    }

    #[tokio::test]
    async fn repeated_deployments_get_distinct_project_ids() {
        let executor = Arc::new(RecordingExecutor::default());

        for _ in 0..5 {
            let app = test_router(Arc::clone(&executor));
            let response = app
                .oneshot(deploy_request(
                    r#"{"repo_url": "https://github.com/acme/site.git"}"#,
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let submitted = executor.submitted.lock().unwrap();
        let ids: std::collections::HashSet<_> = submitted
            .iter()
            .map(|job| job.project_id.as_str().to_owned())
            .collect();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn dispatch_failure_surfaces_as_bad_gateway() {
        let executor = Arc::new(RecordingExecutor {
            fail: true,
            ..Default::default()
        });
        let app = test_router(executor);

        let response = app
            .oneshot(deploy_request(
                r#"{"repo_url": "https://github.com/acme/site.git"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn invalid_repo_url_is_a_bad_request() {
        let executor = Arc::new(RecordingExecutor::default());
        let app = test_router(Arc::clone(&executor));

        let response = app
            .oneshot(deploy_request(r#"{"repo_url": ""}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(executor.submitted.lock().unwrap().is_empty());
    }
}
