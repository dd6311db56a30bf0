//! Loft site-serving gateway.
//!
//! Resolves inbound traffic by hostname: the first label of the host is the
//! project's routing key, and the request is forwarded to
//! `<storage base>/<key>/<path>` with bare root requests rewritten to the
//! index document. Routing is a stateless string transformation computed
//! per request — no routing table, no cache, no existence check.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod proxy;
pub mod server;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use server::run;
