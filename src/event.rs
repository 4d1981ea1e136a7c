//! Event model published to per-client observers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Topic {
    RequestStart,
    RequestEnd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub client_id: String,
    pub topic: Topic,
    pub payload: Value,
}

/// Payload for `REQUEST_START`.
pub fn request_start_payload(
    is_mock: bool,
    method: &str,
    host: &str,
    pathname: &str,
    url: &str,
    headers: &std::collections::HashMap<String, String>,
    request_data: &Value,
) -> Value {
    serde_json::json!({
        "isMock": is_mock,
        "method": method,
        "host": host,
        "pathname": pathname,
        "url": url,
        "requestHeaders": headers,
        "requestData": request_data,
    })
}

/// Payload for `REQUEST_END`.
pub fn request_end_payload(
    status: u16,
    request_data: &Value,
    headers: &std::collections::HashMap<String, String>,
    response_body: &Value,
    timecost_ms: u128,
) -> Value {
    serde_json::json!({
        "status": status,
        "requestData": request_data,
        "requestHeaders": headers,
        "responseBody": response_body,
        "timecost": timecost_ms,
    })
}
