//! Rewrite handler (component E): the `/api/rewrite` endpoint and its
//! protocol state machine, `RECEIVED -> RESOLVED_CLIENT -> DECIDED ->
//! RESPONDING -> DONE`.

use std::collections::HashMap;
use std::time::Instant;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::error::RewriteError;
use crate::event::{request_end_payload, request_start_payload, Topic};
use crate::inbound::{InboundRequest, ReqType};
use crate::matcher::match_rule;
use crate::state::AppState;
use crate::synth::{apply_delay, synthesize, Synthesis};

#[derive(Debug, Deserialize)]
pub struct RewriteQuery {
    pub url: Option<String>,
    pub cookie: Option<String>,
    pub reqtype: Option<String>,
}

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/rewrite", web::get().to(rewrite))
        .route("/api/rewrite", web::post().to(rewrite));
}

pub async fn rewrite(
    req: HttpRequest,
    query: web::Query<RewriteQuery>,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> HttpResponse {
    // RECEIVED
    let Some(raw_url) = query.url.as_deref() else {
        return bad_request("missing url parameter");
    };
    let (target_url, target_query) = match InboundRequest::parse_target(raw_url) {
        Ok(v) => v,
        Err(e) => return bad_request(&e),
    };

    let origin = header_str(&req, "origin");
    let reqtype = match query.reqtype.as_deref() {
        Some("jsonp") => ReqType::Jsonp,
        _ => ReqType::Normal,
    };
    let request_headers = collect_headers(&req);

    if req.method() == actix_web::http::Method::POST {
        let content_type = header_str(&req, "content-type").unwrap_or_default();
        if content_type.starts_with("application/json") && serde_json::from_slice::<serde_json::Value>(&body).is_err() {
            return bad_request("malformed JSON body for application/json content type");
        }
    }

    // RESOLVED_CLIENT
    let cookie_name = crate::config::client_cookie_name();
    let client_id = query
        .cookie
        .as_deref()
        .and_then(|c| InboundRequest::cookie_value(c, &cookie_name));

    let Some(client_id) = client_id else {
        return HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body("no clientID, ignored");
    };

    let inbound = InboundRequest {
        method: req.method().as_str().to_string(),
        host: target_url.host_str().unwrap_or_default().to_string(),
        pathname: target_url.path().to_string(),
        query: target_query,
        cookie: query.cookie.clone(),
        body: body.into(),
        origin,
        reqtype,
        client_id: Some(client_id.clone()),
        request_headers,
        target_url,
    };

    // DECIDED
    let rules = state.rule_store.get(&client_id).await;
    let matched = match_rule(&rules, &inbound).cloned();
    // isMock reflects "a rule matched", not "a rule produced a body" -- a
    // matched rule with no response still counts (it is an observation-only
    // watchpoint per synth::synthesize's PassThrough case).
    let is_mock = matched.is_some();

    let started_at = Instant::now();
    let request_data = inbound.request_data_json();
    state
        .publisher
        .publish(
            &client_id,
            Topic::RequestStart,
            request_start_payload(
                is_mock,
                &inbound.method,
                &inbound.host,
                &inbound.pathname,
                inbound.target_url.as_str(),
                &inbound.request_headers,
                &request_data,
            ),
        )
        .await;

    // RESPONDING
    let (status, content_type, body_bytes, response_headers) = match &matched {
        Some(rule) if rule.response.is_some() => match synthesize(rule, &inbound) {
            Ok(Synthesis::Response(resp)) => {
                apply_delay(rule).await;
                (
                    resp.status,
                    resp.content_type.to_string(),
                    actix_web::web::Bytes::from(resp.body),
                    Vec::new(),
                )
            }
            Ok(Synthesis::PassThrough) => match forward(&state, &inbound).await {
                Ok(v) => v,
                Err(err) => return finish_early(&state, &client_id, &request_data, started_at, &err).await,
            },
            Err(err) => return finish_early(&state, &client_id, &request_data, started_at, &err).await,
        },
        _ => match forward(&state, &inbound).await {
            Ok(v) => v,
            Err(err) => return finish_early(&state, &client_id, &request_data, started_at, &err).await,
        },
    };

    let response_body_json = response_body_as_json(&content_type, &body_bytes);
    let mut builder = HttpResponse::build(
        actix_web::http::StatusCode::from_u16(status).unwrap_or(actix_web::http::StatusCode::OK),
    );
    builder.content_type(content_type.clone());
    crate::cors::echo_origin(&mut builder, inbound.origin.as_deref());
    // append, not insert: upstream may have sent several Set-Cookie headers
    // and all of them must reach the caller intact.
    for (name, value) in &response_headers {
        if !name.eq_ignore_ascii_case("content-type") {
            builder.append_header((name.as_str(), value.as_str()));
        }
    }
    let response = builder.body(body_bytes);

    // DONE
    let timecost = started_at.elapsed().as_millis();
    state
        .publisher
        .publish(
            &client_id,
            Topic::RequestEnd,
            request_end_payload(status, &request_data, &inbound.request_headers, &response_body_json, timecost),
        )
        .await;

    response
}

type ForwardedParts = (u16, String, actix_web::web::Bytes, Vec<(String, String)>);

async fn forward(state: &AppState, inbound: &InboundRequest) -> Result<ForwardedParts, RewriteError> {
    let resp = state.forwarder.forward(inbound).await?;
    // Preserve every header occurrence (notably repeated Set-Cookie).
    let mut headers = Vec::new();
    let mut content_type = "application/octet-stream".to_string();
    for (name, value) in resp.headers.iter() {
        if let Ok(v) = value.to_str() {
            if name.as_str().eq_ignore_ascii_case("content-type") {
                content_type = v.to_string();
            }
            headers.push((name.as_str().to_string(), v.to_string()));
        }
    }
    Ok((resp.status, content_type, actix_web::web::Bytes::from(resp.body), headers))
}

/// Publish `REQUEST_END` carrying the error text as `responseBody` (per the
/// error taxonomy's "full trace"/"error text" requirement) and return the
/// corresponding HTTP response.
async fn finish_early(
    state: &AppState,
    client_id: &str,
    request_data: &serde_json::Value,
    started_at: Instant,
    err: &RewriteError,
) -> HttpResponse {
    let timecost = started_at.elapsed().as_millis();
    state
        .publisher
        .publish(
            client_id,
            Topic::RequestEnd,
            request_end_payload(
                err.status().as_u16(),
                request_data,
                &HashMap::new(),
                &serde_json::Value::String(err.to_string()),
                timecost,
            ),
        )
        .await;
    err.to_response()
}

fn response_body_as_json(content_type: &str, body: &[u8]) -> serde_json::Value {
    if content_type.starts_with("application/json") {
        serde_json::from_slice(body).unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(body).into_owned()))
    } else {
        serde_json::Value::String(String::from_utf8_lossy(body).into_owned())
    }
}

fn header_str(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn collect_headers(req: &HttpRequest) -> HashMap<String, String> {
    req.headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect()
}

fn bad_request(msg: &str) -> HttpResponse {
    HttpResponse::BadRequest()
        .content_type("text/plain; charset=utf-8")
        .body(msg.to_string())
}
