//! Response synthesizer (component C).
//!
//! Turns a matched rule into a concrete `{status, headers, body}`, applying
//! mockjs expansion, JSONP wrapping and the rule's artificial delay.

use crate::error::RewriteError;
use crate::inbound::{InboundRequest, ReqType};
use crate::rule::{ResponseType, Rule};

pub struct SynthesizedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Either a concrete response or a signal to fall back to forwarding.
pub enum Synthesis {
    Response(SynthesizedResponse),
    PassThrough,
}

/// Build the response body for `rule` against `inbound`, without applying delay.
///
/// Delay is a separate step ([`apply_delay`]) so the caller can publish
/// `REQUEST_START` before sleeping, as required by the handler's state
/// machine.
pub fn synthesize(rule: &Rule, inbound: &InboundRequest) -> Result<Synthesis, RewriteError> {
    let Some(response) = &rule.response else {
        return Ok(Synthesis::PassThrough);
    };

    let materialized = match rule.responsetype {
        ResponseType::Raw => response.clone(),
        ResponseType::Mockjs => crate::mockjs::expand(response),
    };

    let (content_type, body_text) = match &materialized {
        serde_json::Value::String(s) => ("text/plain; charset=utf-8", s.clone()),
        other => (
            "application/json; charset=utf-8",
            serde_json::to_string(other)
                .map_err(|e| RewriteError::RuleError(format!("failed to serialize response: {e}")))?,
        ),
    };

    let (content_type, body_text) = if inbound.reqtype == ReqType::Jsonp {
        let callback = inbound
            .query
            .get("callback")
            .ok_or_else(|| RewriteError::RuleError("jsonp requested without callback param".into()))?;
        ("application/javascript", format!("{callback}({body_text})"))
    } else {
        (content_type, body_text)
    };

    Ok(Synthesis::Response(SynthesizedResponse {
        status: rule.status,
        content_type,
        body: body_text.into_bytes(),
    }))
}

/// Suspend for the rule's configured delay, if any. Must run after
/// `REQUEST_START` has been published and before the caller's response is
/// written.
pub async fn apply_delay(rule: &Rule) {
    if let Some(ms) = rule.delay {
        if ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }
    }
}
