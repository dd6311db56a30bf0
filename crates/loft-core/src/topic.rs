//! Log topic naming.
//!
//! The build step publishes each output line to `logs:<project>`; the relay
//! subscribes with the pattern `logs:*` and routes by the concrete channel.

use crate::types::ProjectId;

/// Prefix shared by every log topic.
pub const LOG_TOPIC_PREFIX: &str = "logs:";

/// Pattern covering all log topics, for PSUBSCRIBE.
pub const LOG_TOPIC_PATTERN: &str = "logs:*";

/// The log topic for a project.
#[must_use]
pub fn log_topic(project: &ProjectId) -> String {
    format!("{LOG_TOPIC_PREFIX}{project}")
}

/// Extract the project identifier from a concrete log topic.
///
/// Returns `None` for channels outside the `logs:` namespace or with an
/// empty suffix.
#[must_use]
pub fn project_from_topic(topic: &str) -> Option<ProjectId> {
    match topic.strip_prefix(LOG_TOPIC_PREFIX) {
        Some("") | None => None,
        Some(suffix) => Some(ProjectId::new(suffix)),
    }
}
