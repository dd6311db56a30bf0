//! Shared types for the Loft deployment platform.
//!
//! A deployment is identified by a [`ProjectId`] — a human-readable slug
//! allocated once at dispatch time. The same identifier names the project's
//! log topic (`logs:<id>`), its artifact namespace in object storage
//! (`<base>/<id>/...`), and its serving subdomain (`<id>.<domain>`). Keeping
//! all three derived from one value is what ties the platform together, so
//! the derivations live here rather than in the individual services.

#![forbid(unsafe_code)]

pub mod slug;
pub mod topic;
pub mod types;

pub use topic::{log_topic, project_from_topic, LOG_TOPIC_PATTERN};
pub use types::{DeployJob, ProjectId, ENV_PROJECT_ID, ENV_REPOSITORY_URL};
