//! Loft control plane.
//!
//! The orchestration half of the platform: it accepts deployment requests,
//! dispatches isolated build jobs to the execution backend, and relays each
//! build's live log output from the bus to any number of WebSocket
//! observers.
//!
//! # Architecture
//!
//! - **Orchestrator** ([`api`] + [`dispatch`]): `POST /deployments`
//!   allocates a project slug, hands the job to the execution backend, and
//!   responds `queued` immediately. Fire-and-forget — no completion
//!   tracking lives here; the log stream is the only progress signal.
//! - **Log relay** ([`relay`]): one pattern subscription (`logs:*`) on a
//!   dedicated bus connection, demultiplexed per concrete topic into
//!   broadcast groups of observer connections. Best-effort, at-most-once
//!   delivery per observer; a slow observer loses lines rather than
//!   delaying anyone else.

#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod relay;
pub mod server;

pub use config::ControlConfig;
pub use error::{ControlError, ControlResult};
pub use server::run;
