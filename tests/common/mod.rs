//! Mock Nitro appliance for integration tests.
//!
//! Serves literal JSON fixtures over plain HTTP on an ephemeral port and
//! records every request, so tests can assert on exactly which Nitro calls a
//! scrape made.

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netscaler_exporter::exporter::ExporterOptions;
use netscaler_exporter::nitro::{ClientSettings, DeviceQuirks, DeviceTarget};
use netscaler_exporter::scrape::ScrapeSettings;

pub const SESSION_TOKEN: &str = "##MOCKSESSION";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Resource path below `/nitro/v1/`, plus `?k=v` (decoded, sorted) if any.
    pub key: String,
    pub cookie: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

struct MockState {
    fixtures: HashMap<String, (u16, Value)>,
    delays: HashMap<String, Duration>,
    login: (u16, Value),
    logout_status: u16,
    set_cookie: bool,
    requests: Mutex<Vec<RecordedRequest>>,
    logins: AtomicUsize,
    logouts: AtomicUsize,
}

/// Builder for a [`MockAppliance`].
pub struct MockBuilder {
    fixtures: HashMap<String, (u16, Value)>,
    delays: HashMap<String, Duration>,
    login: (u16, Value),
    logout_status: u16,
    set_cookie: bool,
}

impl MockBuilder {
    /// Serves `body` with HTTP 200 for `key` (`stat/lbvserver`, or
    /// `stat/servicegroupmember?args=...` for an exact query).
    pub fn fixture(self, key: &str, body: Value) -> Self {
        self.fixture_with_status(key, 200, body)
    }

    pub fn fixture_with_status(mut self, key: &str, status: u16, body: Value) -> Self {
        self.fixtures.insert(key.to_string(), (status, body));
        self
    }

    /// Delays every response for `path` (query ignored).
    pub fn delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    pub fn login_response(mut self, status: u16, body: Value) -> Self {
        self.login = (status, body);
        self
    }

    pub fn logout_status(mut self, status: u16) -> Self {
        self.logout_status = status;
        self
    }

    /// Issue the token only in the login body, not as a cookie.
    pub fn without_cookie(mut self) -> Self {
        self.set_cookie = false;
        self
    }

    pub async fn start(self) -> MockAppliance {
        let state = Arc::new(MockState {
            fixtures: self.fixtures,
            delays: self.delays,
            login: self.login,
            logout_status: self.logout_status,
            set_cookie: self.set_cookie,
            requests: Mutex::new(Vec::new()),
            logins: AtomicUsize::new(0),
            logouts: AtomicUsize::new(0),
        });

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock appliance");
        let addr = listener.local_addr().expect("Mock appliance has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock appliance failed");
        });

        MockAppliance {
            base_url: format!("http://{}", addr),
            state,
        }
    }
}

pub struct MockAppliance {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockAppliance {
    pub fn builder() -> MockBuilder {
        MockBuilder {
            fixtures: HashMap::new(),
            delays: HashMap::new(),
            login: (
                201,
                json!({
                    "errorcode": 0,
                    "message": "Done",
                    "severity": "NONE",
                    "sessionid": SESSION_TOKEN
                }),
            ),
            logout_status: 201,
            set_cookie: true,
        }
    }

    pub fn target(&self) -> DeviceTarget {
        DeviceTarget::new(
            &self.base_url,
            "nsroot",
            SecretString::from("nsroot-password".to_string()),
            false,
        )
        .expect("Mock target should be valid")
    }

    pub fn login_count(&self) -> usize {
        self.state.logins.load(Ordering::SeqCst)
    }

    pub fn logout_count(&self) -> usize {
        self.state.logouts.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("poisoned").clone()
    }

    /// GET requests whose key starts with `prefix`.
    pub fn gets_matching(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "GET" && r.key.starts_with(prefix))
            .collect()
    }
}

/// Nitro error envelope.
pub fn nitro_error(errorcode: i64, message: &str) -> Value {
    json!({"errorcode": errorcode, "message": message, "severity": "ERROR"})
}

/// Successful envelope carrying `records` under `key`.
pub fn nitro_ok(key: &str, records: Value) -> Value {
    let mut body = json!({"errorcode": 0, "message": "Done", "severity": "NONE"});
    body[key] = records;
    body
}

pub fn test_settings() -> ClientSettings {
    ClientSettings {
        request_timeout: Duration::from_secs(5),
        quirks: DeviceQuirks::default(),
    }
}

pub fn test_options() -> ExporterOptions {
    ExporterOptions {
        client: test_settings(),
        scrape: ScrapeSettings {
            scrape_timeout: Duration::from_secs(10),
            max_concurrent_fetches: 4,
        },
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri
        .path()
        .trim_start_matches("/nitro/v1/")
        .to_string();
    let key = if query.is_empty() {
        path.clone()
    } else {
        let sorted: BTreeMap<_, _> = query.into_iter().collect();
        let pairs: Vec<String> = sorted.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!("{}?{}", path, pairs.join("&"))
    };

    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state
        .requests
        .lock()
        .expect("poisoned")
        .push(RecordedRequest {
            method: method.to_string(),
            key: key.clone(),
            cookie: header_value(header::COOKIE),
            content_type: header_value(header::CONTENT_TYPE),
            body,
        });

    if let Some(delay) = state.delays.get(&path) {
        tokio::time::sleep(*delay).await;
    }

    if method == Method::POST && path == "config/login" {
        state.logins.fetch_add(1, Ordering::SeqCst);
        let (status, body) = &state.login;
        let mut response = json_response(*status, body.clone());
        if state.set_cookie && *status < 300 {
            let cookie = format!("NITRO_AUTH_TOKEN={}; path=/nitro/v1", SESSION_TOKEN);
            if let Ok(value) = cookie.parse() {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
        }
        return response;
    }

    if method == Method::POST && path == "config/logout" {
        state.logouts.fetch_add(1, Ordering::SeqCst);
        return json_response(
            state.logout_status,
            json!({"errorcode": 0, "message": "Done", "severity": "NONE"}),
        );
    }

    if method != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let fixture = state
        .fixtures
        .get(&key)
        .or_else(|| state.fixtures.get(&path))
        .cloned();
    match fixture {
        Some((status, body)) => json_response(status, body),
        None => json_response(
            200,
            json!({"errorcode": 0, "message": "Done", "severity": "NONE"}),
        ),
    }
}

fn json_response(status: u16, body: Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}
