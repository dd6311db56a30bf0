//! Subdomain-keyed reverse proxy in front of artifact storage.
//!
//! Every inbound request is routed by a pure string transformation: the
//! first label of the request's hostname selects the project namespace, and
//! the upstream path becomes `<base>/<key><path>` (with bare `/` rewritten
//! to the index document after the key is attached). The gateway performs
//! no existence check — storage is the sole source of truth, and an unknown
//! project simply surfaces whatever the store returns, typically not-found.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderName, Method};
use axum::response::Response;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::GatewayError;

/// Shared proxy state.
#[derive(Debug, Clone)]
pub struct ProxyState {
    client: reqwest::Client,
    base: String,
    index_document: String,
}

impl ProxyState {
    /// Create proxy state from upstream configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(GatewayError::Upstream)?;

        Ok(Self {
            client,
            base: config.base.trim_end_matches('/').to_owned(),
            index_document: config.index_document.clone(),
        })
    }
}

/// Serve one site request: derive the routing key, rewrite the target, and
/// relay the upstream response unmodified.
pub async fn serve_site(
    State(state): State<Arc<ProxyState>>,
    request: Request,
) -> Result<Response, GatewayError> {
    let host = request_host(&request).ok_or(GatewayError::MissingHost)?;
    let key = routing_key(&host)
        .ok_or(GatewayError::MissingHost)?
        .to_owned();

    let url = upstream_url(
        &state.base,
        &key,
        request.uri().path(),
        request.uri().query(),
        &state.index_document,
    );

    debug!(host = %host, key = %key, upstream = %url, "routing site request");

    let (parts, body) = request.into_parts();

    let mut upstream = state.client.request(parts.method.clone(), &url);
    for (name, value) in &parts.headers {
        if name != header::HOST {
            upstream = upstream.header(name, value);
        }
    }

    // GET/HEAD carry no body; anything else is forwarded as-is.
    if !matches!(parts.method, Method::GET | Method::HEAD) {
        upstream = upstream.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let response = upstream.send().await?;
    passthrough(response)
}

/// Relay an upstream response — status, headers, and streamed body — to the
/// original caller.
fn passthrough(response: reqwest::Response) -> Result<Response, GatewayError> {
    let mut builder = Response::builder().status(response.status());

    for (name, value) in response.headers() {
        if !is_hop_by_hop(name) {
            builder = builder.header(name, value);
        }
    }

    builder
        .body(Body::from_stream(response.bytes_stream()))
        .map_err(|e| GatewayError::RequestBuildFailed(e.to_string()))
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// The hostname a request was addressed to, from the `Host` header or the
/// request target.
fn request_host(request: &Request) -> Option<String> {
    if let Some(host) = request.headers().get(header::HOST) {
        return host.to_str().ok().map(ToOwned::to_owned);
    }
    request.uri().host().map(ToOwned::to_owned)
}

/// Derive the routing key: the first label of the hostname, port stripped.
///
/// No validation that the key names an existing project.
#[must_use]
pub fn routing_key(host: &str) -> Option<&str> {
    let without_port = host.split(':').next()?;
    let label = without_port.split('.').next()?;
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

/// Build the upstream request target.
///
/// The root rewrite applies to exactly `/`, after the key prefix is
/// attached.
#[must_use]
pub fn upstream_url(
    base: &str,
    key: &str,
    path: &str,
    query: Option<&str>,
    index_document: &str,
) -> String {
    let base = base.trim_end_matches('/');
    let mut url = if path == "/" {
        format!("{base}/{key}/{index_document}")
    } else {
        format!("{base}/{key}{path}")
    };
    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }
    url
}
