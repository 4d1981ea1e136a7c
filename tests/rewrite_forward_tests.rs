use actix_web::{test, web, App};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use rewrite_proxy::config_routes;
use rewrite_proxy::forwarder::HttpForwarder;
use rewrite_proxy::publisher::BroadcastPublisher;
use rewrite_proxy::rule::{PathType, ResponseType, Rule};
use rewrite_proxy::{AppState, RuleStore};

#[derive(Clone, Default)]
struct UpstreamRecorder {
    last_cookie: Arc<AsyncMutex<Option<String>>>,
    last_body: Arc<AsyncMutex<Value>>,
}

async fn handle_get(
    State(state): State<UpstreamRecorder>,
    req: axum::http::Request<axum::body::Body>,
) -> &'static str {
    let cookie = req
        .headers()
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.last_cookie.lock().await = cookie;
    "I am running!"
}

async fn handle_post(
    State(state): State<UpstreamRecorder>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    *state.last_body.lock().await = payload.clone();
    Json(json!({"echo": payload}))
}

struct MockUpstream {
    base_url: String,
    recorder: UpstreamRecorder,
    join: JoinHandle<()>,
}

impl MockUpstream {
    async fn start() -> Self {
        let recorder = UpstreamRecorder::default();
        let app = Router::new()
            .route("/api/test", get(handle_get))
            .route("/api/test", post(handle_post))
            .route("/api/nonexist", get(handle_get))
            .with_state(recorder.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind upstream");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{addr}");

        let join = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("upstream server error");
        });

        Self {
            base_url,
            recorder,
            join,
        }
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.join.abort();
    }
}

fn state_with_forwarder() -> (AppState, Arc<BroadcastPublisher>) {
    let publisher = Arc::new(BroadcastPublisher::new());
    let state = AppState {
        rule_store: Arc::new(RuleStore::new()),
        publisher: publisher.clone(),
        forwarder: Arc::new(HttpForwarder::from_env()),
    };
    (state, publisher)
}

fn mock_rule(path: &str, response: Value) -> Rule {
    Rule {
        host: None,
        path: path.into(),
        pathtype: PathType::Literal,
        prepath: None,
        params: None,
        delay: None,
        status: 200,
        responsetype: ResponseType::Raw,
        response: Some(response),
        compiled_path: None,
    }
}

#[actix_web::test]
async fn forward_get_with_no_rules_relays_upstream_body_and_events() {
    let upstream = MockUpstream::start().await;
    let (state, publisher) = state_with_forwarder();
    let mut rx = publisher.subscribe("clientid");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(config_routes),
    )
    .await;

    let url = format!("{}/api/test", upstream.base_url);
    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/rewrite?url={}&cookie=__pmid=clientid",
            urlencoding_encode(&url)
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body = test::read_body(resp).await;
    assert_eq!(body, "I am running!");

    let start = rx.recv().await.unwrap();
    assert_eq!(start.payload["isMock"], false);
    assert_eq!(start.payload["method"], "GET");
    let end = rx.recv().await.unwrap();
    assert_eq!(end.payload["status"], 200);
    assert_eq!(end.payload["requestData"], "not POST request");
}

#[actix_web::test]
async fn forward_post_echoes_cors_and_strips_client_cookie() {
    let upstream = MockUpstream::start().await;
    let (state, _publisher) = state_with_forwarder();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(config_routes),
    )
    .await;

    let url = format!("{}/api/test", upstream.base_url);
    let req = test::TestRequest::post()
        .uri(&format!(
            "/api/rewrite?url={}&cookie={}",
            urlencoding_encode(&url),
            urlencoding_encode("testkey=testvalue; __pmid=clientid")
        ))
        .insert_header(("Origin", "fakeorigin.com"))
        .set_json(&json!({"a": 1, "b": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let origin_header = resp
        .headers()
        .get("Access-Control-Allow-Origin")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let creds_header = resp
        .headers()
        .get("Access-Control-Allow-Credentials")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    assert_eq!(origin_header.as_deref(), Some("fakeorigin.com"));
    assert_eq!(creds_header.as_deref(), Some("true"));

    let upstream_body = upstream.recorder.last_body.lock().await.clone();
    assert_eq!(upstream_body["a"], 1);
    assert_eq!(upstream_body["b"], 2);
}

#[actix_web::test]
async fn mock_by_path_short_circuits_before_forwarding() {
    let (state, _publisher) = state_with_forwarder();
    state
        .rule_store
        .put(
            "clientid".into(),
            vec![mock_rule(
                "/api/nonexist",
                json!({"code": 200, "msg": "mock response"}),
            )],
        )
        .await
        .unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(config_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/rewrite?url={}&cookie=__pmid=clientid",
            urlencoding_encode("https://example.com/api/nonexist")
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body = test::read_body(resp).await;
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["msg"], "mock response");
}

#[actix_web::test]
async fn mock_with_mockjs_array_expansion() {
    let (state, _publisher) = state_with_forwarder();
    let mut rule = mock_rule(
        "/api/nonexist",
        json!({"code": 200, "msg|3": ["mock response"]}),
    );
    rule.responsetype = ResponseType::Mockjs;
    state.rule_store.put("clientid".into(), vec![rule]).await.unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(config_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/rewrite?url={}&cookie=__pmid=clientid",
            urlencoding_encode("https://example.com/api/nonexist")
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body = test::read_body(resp).await;
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["msg"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn regexp_host_prepath_and_params_must_all_match() {
    let (state, _publisher) = state_with_forwarder();
    let mut rule = mock_rule("/test", json!({"matched": true}));
    rule.host = Some("example.com".into());
    rule.prepath = Some("/api".into());
    rule.params = Some("a=1&b=2".into());
    state.rule_store.put("clientid".into(), vec![rule]).await.unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(config_routes),
    )
    .await;

    // missing b=2 -> rule does not match -> forwards (and fails, since example.com
    // is not reachable in this test sandbox, but the body must not be the mock body).
    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/rewrite?url={}&cookie=__pmid=clientid",
            urlencoding_encode("https://example.com/api/test?a=1")
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body = test::read_body(resp).await;
    assert_ne!(body, web::Bytes::from_static(br#"{"matched":true}"#));

    // a=1&b=2 present -> matches -> mock body returned.
    let req2 = test::TestRequest::get()
        .uri(&format!(
            "/api/rewrite?url={}&cookie=__pmid=clientid",
            urlencoding_encode("https://example.com/api/test?a=1&b=2")
        ))
        .to_request();
    let resp2 = test::call_service(&app, req2).await;
    assert!(resp2.status().is_success());
    let body2 = test::read_body(resp2).await;
    let parsed: Value = serde_json::from_slice(&body2).unwrap();
    assert_eq!(parsed["matched"], true);
}

#[actix_web::test]
async fn jsonp_wraps_body_preserving_nested_parens() {
    let (state, _publisher) = state_with_forwarder();
    state
        .rule_store
        .put(
            "clientid".into(),
            vec![mock_rule(
                "/api/nonexist",
                json!({"code": 200, "msg": "(a(b)c)"}),
            )],
        )
        .await
        .unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(config_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/rewrite?url={}&cookie=__pmid=clientid&reqtype=jsonp",
            urlencoding_encode("https://example.com/api/nonexist?callback=jsonp_cb")
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body = test::read_body(resp).await;
    assert_eq!(body, r#"jsonp_cb({"code":200,"msg":"(a(b)c)"})"#.as_bytes());
}

#[actix_web::test]
async fn missing_client_id_short_circuits_without_events() {
    let (state, publisher) = state_with_forwarder();
    let mut rx = publisher.subscribe("clientid");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(config_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/rewrite?url={}",
            urlencoding_encode("https://example.com/api/test")
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body = test::read_body(resp).await;
    assert_eq!(body, "no clientID, ignored");

    // no event was published for the short-circuited request
    assert!(rx.try_recv().is_err());
}

#[actix_web::test]
async fn malformed_json_body_with_json_content_type_is_bad_request_with_no_event() {
    let (state, publisher) = state_with_forwarder();
    let mut rx = publisher.subscribe("clientid");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(config_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!(
            "/api/rewrite?url={}&cookie=__pmid=clientid",
            urlencoding_encode("https://example.com/api/test")
        ))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not valid json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

    // no event was published for the short-circuited request
    assert!(rx.try_recv().is_err());
}

/// Minimal percent-encoding for query values in test request URIs; avoids
/// pulling in a dedicated crate just for this test helper.
fn urlencoding_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
