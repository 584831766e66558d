//! Inbound forwarding middleware
//!
//! Adapter for hosts serving AI endpoints themselves: matching inbound
//! requests are forwarded to the governance process and its response is
//! returned verbatim. Forwarding failures fall back to the host's own handler,
//! as do bodies larger than `max_body_bytes`.

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{
        header::{CONNECTION, CONTENT_LENGTH, HOST},
        request::Parts,
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, warn};

use super::route::GuardianRoute;
use crate::domain::error::{GuardianError, Result};
use crate::domain::models::{ForwardingConfig, ORIGINAL_DESTINATION_HEADER};

/// Forwards inbound AI requests to the governance process
#[derive(Debug, Clone)]
pub struct GuardianForwarder {
    route: GuardianRoute,
    client: Client,
    timeout: Duration,
    fail_open: bool,
    max_body_bytes: usize,
}

impl GuardianForwarder {
    pub fn new(route: GuardianRoute, config: &ForwardingConfig) -> Result<Self> {
        let client = Client::builder().no_proxy().build()?;
        Ok(Self {
            route,
            client,
            timeout: config.timeout(),
            fail_open: config.fail_open,
            max_body_bytes: config.max_body_bytes,
        })
    }

    pub fn route(&self) -> &GuardianRoute {
        &self.route
    }

    /// Wrap `router` so its AI endpoints are forwarded while the controller is ready
    pub fn wrap(self, router: Router) -> Router {
        router.layer(middleware::from_fn_with_state(self, forward_ai_requests))
    }

    /// Send the buffered request to `target` and convert the reply
    async fn forward(
        &self,
        parts: &Parts,
        body: Bytes,
        original_url: &Url,
        target: Url,
    ) -> Result<Response> {
        let mut headers = parts.headers.clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(HOST);
        headers.remove(CONTENT_LENGTH);
        let destination = HeaderValue::from_str(original_url.as_str())
            .map_err(|e| GuardianError::Forwarding(e.to_string()))?;
        headers.insert(ORIGINAL_DESTINATION_HEADER, destination);

        let upstream = self
            .client
            .request(parts.method.clone(), target)
            .headers(headers)
            .body(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| GuardianError::Forwarding(e.to_string()))?;

        let status = upstream.status();
        let mut response_headers = upstream.headers().clone();
        strip_hop_by_hop(&mut response_headers);
        let bytes = upstream
            .bytes()
            .await
            .map_err(|e| GuardianError::Forwarding(e.to_string()))?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}

/// Connection-scoped headers that never cross a proxy hop
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any listed in `Connection`
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

fn declared_length(parts: &Parts) -> Option<usize> {
    parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Reconstruct the absolute URL an inbound request was addressed to
fn absolute_url(parts: &Parts) -> Option<Url> {
    if parts.uri.scheme().is_some() {
        return Url::parse(&parts.uri.to_string()).ok();
    }

    let host = parts
        .headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let scheme = parts
        .headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or("/", |pq| pq.as_str());

    Url::parse(&format!("{scheme}://{host}{path_and_query}")).ok()
}

/// axum middleware forwarding matching requests to the governance process
pub async fn forward_ai_requests(
    State(forwarder): State<GuardianForwarder>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let Some((original_url, target)) = absolute_url(&parts)
        .and_then(|url| forwarder.route.target_for(&url).map(|target| (url, target)))
    else {
        return next.run(Request::from_parts(parts, body)).await;
    };

    let limit = forwarder.max_body_bytes;
    if declared_length(&parts).is_some_and(|len| len > limit) {
        if forwarder.fail_open {
            debug!(path = %parts.uri.path(), limit, "Request body over forwarding limit, handling locally");
            return next.run(Request::from_parts(parts, body)).await;
        }
        warn!(path = %parts.uri.path(), limit, "Request body over forwarding limit");
        return StatusCode::PAYLOAD_TOO_LARGE.into_response();
    }

    // Length unknown up front: fail-open reads the body whole
    let buffer_limit = if forwarder.fail_open { usize::MAX } else { limit };
    let bytes = match axum::body::to_bytes(body, buffer_limit).await {
        Ok(bytes) => bytes,
        Err(e) if forwarder.fail_open => {
            warn!(path = %parts.uri.path(), error = %e, "Failed to read request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
        Err(e) => {
            warn!(path = %parts.uri.path(), error = %e, "Failed to buffer request body for Guardian");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };
    if bytes.len() > limit {
        debug!(path = %parts.uri.path(), limit, "Request body over forwarding limit, handling locally");
        return next.run(Request::from_parts(parts, Body::from(bytes))).await;
    }

    debug!(path = %parts.uri.path(), original_url = %original_url, "Forwarding AI endpoint to Guardian");

    match forwarder
        .forward(&parts, bytes.clone(), &original_url, target)
        .await
    {
        Ok(response) => response,
        Err(e) if forwarder.fail_open => {
            warn!(error = %e, "Error forwarding request to Guardian, handling locally");
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(e) => {
            warn!(error = %e, "Error forwarding request to Guardian");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}
