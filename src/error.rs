//! Error taxonomy for the rewrite engine.
//!
//! Every path through the handler produces a response; this enum exists so
//! that internal failures carry a reason through to the closing event without
//! forcing every call site to build its own HTTP response by hand.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;

/// Failure modes surfaced by the rewrite pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// The `url` query parameter was missing or failed to parse.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The upstream forward could not be completed.
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),

    /// A matched rule could not be synthesized into a response.
    #[error("rule error: {0}")]
    RuleError(String),
}

impl RewriteError {
    pub fn status(&self) -> StatusCode {
        match self {
            RewriteError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RewriteError::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
            RewriteError::RuleError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render as the plain-text response body the caller receives.
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::build(self.status())
            .content_type("text/plain; charset=utf-8")
            .body(self.to_string())
    }
}
