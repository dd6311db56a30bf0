//! Core types shared between the control plane and the gateway.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::slug;

/// Environment variable carrying the source repository URL to the builder.
pub const ENV_REPOSITORY_URL: &str = "GIT_REPOSITORY_URL";

/// Environment variable carrying the project identifier to the builder.
pub const ENV_PROJECT_ID: &str = "PROJECT_ID";

/// Unique identifier for a deployed project.
///
/// A human-readable slug, allocated once per deployment request. Doubles as
/// the log-topic suffix, the artifact-namespace prefix, and the routing
/// subdomain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(String);

impl ProjectId {
    /// Create a project ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, collision-resistant project ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(slug::generate())
    }

    /// Return the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A build job handed to the execution backend.
///
/// Owned by the orchestrator only until submission; no reference is retained
/// afterwards (fire-and-forget dispatch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployJob {
    /// Project this job builds.
    pub project_id: ProjectId,
    /// Source repository URL.
    pub repo_url: String,
    /// Extra environment variables requested by the caller.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl DeployJob {
    /// Create a job for the given project and repository.
    #[must_use]
    pub fn new(project_id: ProjectId, repo_url: impl Into<String>) -> Self {
        Self {
            project_id,
            repo_url: repo_url.into(),
            env: HashMap::new(),
        }
    }

    /// Attach caller-supplied environment variables.
    #[must_use]
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// The full environment handed to the execution backend.
    ///
    /// Caller extras first, then the two required variables — so extras can
    /// never shadow the repository URL or the project identifier.
    #[must_use]
    pub fn environment(&self) -> HashMap<String, String> {
        let mut env = self.env.clone();
        env.insert(ENV_REPOSITORY_URL.to_owned(), self.repo_url.clone());
        env.insert(ENV_PROJECT_ID.to_owned(), self.project_id.to_string());
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_carries_required_variables() {
        let job = DeployJob::new(ProjectId::new("brave-otter"), "https://example.com/repo.git");
        let env = job.environment();
        assert_eq!(env.get(ENV_PROJECT_ID).map(String::as_str), Some("brave-otter"));
        assert_eq!(
            env.get(ENV_REPOSITORY_URL).map(String::as_str),
            Some("https://example.com/repo.git")
        );
    }

    #[test]
    fn caller_extras_cannot_shadow_required_variables() {
        let mut extras = HashMap::new();
        extras.insert(ENV_PROJECT_ID.to_owned(), "forged".to_owned());
        extras.insert("NODE_ENV".to_owned(), "production".to_owned());

        let job = DeployJob::new(ProjectId::new("brave-otter"), "https://example.com/repo.git")
            .with_env(extras);
        let env = job.environment();

        assert_eq!(env.get(ENV_PROJECT_ID).map(String::as_str), Some("brave-otter"));
        assert_eq!(env.get("NODE_ENV").map(String::as_str), Some("production"));
    }

    #[test]
    fn project_id_round_trips_through_serde() {
        let id = ProjectId::new("calm-heron");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"calm-heron\"");
        let back: ProjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
