//! Upstream forwarder (component D).
//!
//! Mirrors method, headers, body and the caller-supplied cookie string to
//! the real target, follows redirects, and captures status/headers/body
//! unmodified. Defined behind a trait so tests can substitute a stub
//! without standing up a real HTTP client.

use async_trait::async_trait;
use http::HeaderMap;

use crate::error::RewriteError;
use crate::inbound::InboundRequest;

const MAX_REDIRECTS: usize = 5;

pub struct UpstreamResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: bytes::Bytes,
}

#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, inbound: &InboundRequest) -> Result<UpstreamResponse, RewriteError>;
}

/// Shared `reqwest::Client`-backed forwarder.
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a client honoring the redirect cap this component documents.
    /// Proxy/timeout environment handling mirrors the shared client used
    /// elsewhere in this service; see [`crate::config::build_http_client`].
    pub fn from_env() -> Self {
        Self::new(crate::config::build_http_client())
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, inbound: &InboundRequest) -> Result<UpstreamResponse, RewriteError> {
        let method = reqwest::Method::from_bytes(inbound.method.as_bytes())
            .map_err(|e| RewriteError::BadRequest(format!("invalid method: {e}")))?;

        let mut req = self.client.request(method, inbound.target_url.clone());
        let outbound_cookie = inbound.cookie.as_deref().and_then(|c| {
            InboundRequest::strip_cookie(c, &crate::config::client_cookie_name())
        });
        if let Some(cookie) = outbound_cookie {
            req = req.header(http::header::COOKIE, cookie);
        }
        for (name, value) in &inbound.request_headers {
            // "cookie" is handled above from the `cookie` query parameter;
            // the caller's own Cookie header to this proxy is not forwarded.
            if is_hop_by_hop(name) || name.eq_ignore_ascii_case("cookie") {
                continue;
            }
            req = req.header(name.as_str(), value.as_str());
        }
        if !inbound.body.is_empty() {
            req = req.body(inbound.body.clone());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| RewriteError::UpstreamFailure(describe(&e)))?;

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| RewriteError::UpstreamFailure(describe(&e)))?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_redirect() {
        format!("redirect limit ({MAX_REDIRECTS}) exceeded: {err}")
    } else if err.is_timeout() {
        format!("upstream timed out: {err}")
    } else if err.is_connect() {
        format!("upstream connect failed: {err}")
    } else {
        err.to_string()
    }
}

/// Headers that must not be mirrored onto the outbound request: connection
/// framing and the content-length the client library recomputes itself.
fn is_hop_by_hop(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection" | "content-length" | "host" | "transfer-encoding"
    )
}
