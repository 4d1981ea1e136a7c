//! Inbound request model.
//!
//! Everything the matcher, synthesizer and forwarder need, derived once from
//! the `/api/rewrite` query string, headers and body.

use std::collections::HashMap;

use url::Url;

/// How the caller wants the response body wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReqType {
    Normal,
    Jsonp,
}

pub struct InboundRequest {
    pub method: String,
    pub target_url: Url,
    pub host: String,
    pub pathname: String,
    pub query: HashMap<String, String>,
    /// Raw `cookie` query parameter, used to resolve the client id and (with
    /// the client-id pair stripped) as the outbound `Cookie` header.
    pub cookie: Option<String>,
    pub body: bytes::Bytes,
    pub origin: Option<String>,
    pub reqtype: ReqType,
    pub client_id: Option<String>,
    pub request_headers: HashMap<String, String>,
}

impl InboundRequest {
    /// Parse the `url` query parameter into a `Url`, along with its own query map.
    pub fn parse_target(raw_url: &str) -> Result<(Url, HashMap<String, String>), String> {
        let target = Url::parse(raw_url).map_err(|e| format!("invalid url '{raw_url}': {e}"))?;
        let query = target
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Ok((target, query))
    }

    /// Decode an `application/x-www-form-urlencoded` body into a key-value map.
    pub fn decode_form_body(body: &[u8]) -> HashMap<String, String> {
        form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Extract the named cookie's value from a `k=v; k=v` cookie string.
    pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
        cookie_header.split(';').find_map(|pair| {
            let pair = pair.trim();
            let (k, v) = pair.split_once('=')?;
            if k.trim() == name {
                Some(v.trim().to_string())
            } else {
                None
            }
        })
    }

    /// Rebuild a `k=v; k=v` cookie string with the named cookie removed.
    ///
    /// `cookie` carries the client-id cookie only so this proxy can find the
    /// client; it is not meant to impersonate the client to the real
    /// upstream, so it is stripped before the string is mirrored outbound.
    pub fn strip_cookie(cookie_header: &str, name: &str) -> Option<String> {
        let remaining: Vec<&str> = cookie_header
            .split(';')
            .map(str::trim)
            .filter(|pair| {
                pair.split_once('=')
                    .map(|(k, _)| k.trim() != name)
                    .unwrap_or(true)
            })
            .filter(|pair| !pair.is_empty())
            .collect();
        if remaining.is_empty() {
            None
        } else {
            Some(remaining.join("; "))
        }
    }

    /// JSON-friendly view of the query/form-decoded body for `REQUEST_START.requestData`.
    pub fn request_data_json(&self) -> serde_json::Value {
        if self.method.eq_ignore_ascii_case("POST") {
            match serde_json::from_slice::<serde_json::Value>(&self.body) {
                Ok(v) => v,
                Err(_) => serde_json::Value::String(String::from_utf8_lossy(&self.body).into_owned()),
            }
        } else {
            serde_json::Value::String("not POST request".into())
        }
    }
}
