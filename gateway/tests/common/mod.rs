#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use gateway::{
    metrics::GatewayMetrics,
    routes,
    state::AppState,
    store::{PlayerStatsStore, StoreError, StoreResult},
    validation::KnownProtocols,
};
use prometheus::Registry;
use shared::{IpInfoResponse, PlayerInfoResponse, SessionIdResponse};
use tower::ServiceExt;
use uuid::Uuid;

pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Default)]
struct Tables {
    players: HashMap<String, PlayerInfoResponse>,
    ips: Vec<(i64, String)>,
    sessions: HashMap<String, i64>,
    closed_sessions: Vec<i64>,
}

/// In-memory stand-in for the `stew_player_stats` procedures
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn closed_sessions(&self) -> Vec<i64> {
        self.tables.lock().unwrap().closed_sessions.clone()
    }

    fn record(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tables.lock().unwrap()
    }
}

fn player(uuid: &str, name: &str, version: &str) -> PlayerInfoResponse {
    PlayerInfoResponse {
        uuid: Uuid::parse_str(uuid).ok(),
        name: name.to_string(),
        version: version.parse().unwrap_or_default(),
    }
}

#[async_trait]
impl PlayerStatsStore for MemoryStore {
    async fn add_player_info(&self, uuid: &str, name: &str, version: &str) -> StoreResult<()> {
        self.record()
            .players
            .insert(uuid.to_string(), player(uuid, name, version));
        Ok(())
    }

    async fn get_player_info(&self, uuid: &str) -> StoreResult<Option<PlayerInfoResponse>> {
        Ok(self.record().players.get(uuid).cloned())
    }

    async fn update_player_info(&self, uuid: &str, name: &str, version: &str) -> StoreResult<()> {
        let mut tables = self.record();
        if let Some(existing) = tables.players.get_mut(uuid) {
            *existing = player(uuid, name, version);
        }
        Ok(())
    }

    async fn add_ip_info(&self, ip: &str) -> StoreResult<()> {
        let mut tables = self.record();
        if !tables.ips.iter().any(|(_, known)| known == ip) {
            let id = tables.ips.len() as i64 + 1;
            tables.ips.push((id, ip.to_string()));
        }
        Ok(())
    }

    async fn get_ip_info(&self, ip: &str) -> StoreResult<Vec<IpInfoResponse>> {
        Ok(self
            .record()
            .ips
            .iter()
            .filter(|(_, known)| known == ip)
            .map(|(id, _)| IpInfoResponse { id: *id })
            .collect())
    }

    async fn handle_player_login(&self, uuid: &str, _ip_id: &str) -> StoreResult<()> {
        let mut tables = self.record();
        let id = tables.sessions.len() as i64 + 1;
        tables.sessions.insert(uuid.to_string(), id);
        Ok(())
    }

    async fn get_session_id(&self, uuid: &str) -> StoreResult<Option<SessionIdResponse>> {
        Ok(self
            .record()
            .sessions
            .get(uuid)
            .map(|id| SessionIdResponse { id: *id }))
    }

    async fn update_login_session(&self, id: &str) -> StoreResult<()> {
        let mut tables = self.record();
        if let Ok(id) = id.parse() {
            tables.closed_sessions.push(id);
        }
        Ok(())
    }
}

/// Every procedure times out
pub struct FailingStore;

fn timed_out<T>(procedure: &'static str) -> StoreResult<T> {
    Err(StoreError::Timeout {
        procedure,
        timeout: Duration::from_secs(3),
    })
}

#[async_trait]
impl PlayerStatsStore for FailingStore {
    async fn add_player_info(&self, _: &str, _: &str, _: &str) -> StoreResult<()> {
        timed_out("add_player_info")
    }
    async fn get_player_info(&self, _: &str) -> StoreResult<Option<PlayerInfoResponse>> {
        timed_out("get_player_info")
    }
    async fn update_player_info(&self, _: &str, _: &str, _: &str) -> StoreResult<()> {
        timed_out("update_player_info")
    }
    async fn add_ip_info(&self, _: &str) -> StoreResult<()> {
        timed_out("add_ip_info")
    }
    async fn get_ip_info(&self, _: &str) -> StoreResult<Vec<IpInfoResponse>> {
        timed_out("get_ip_info")
    }
    async fn handle_player_login(&self, _: &str, _: &str) -> StoreResult<()> {
        timed_out("handle_player_logins")
    }
    async fn get_session_id(&self, _: &str) -> StoreResult<Option<SessionIdResponse>> {
        timed_out("get_session_id")
    }
    async fn update_login_session(&self, _: &str) -> StoreResult<()> {
        timed_out("update_login_session")
    }
}

pub fn app_with(store: Arc<dyn PlayerStatsStore>) -> Router {
    let registry = Registry::new_custom(Some("stew".into()), None).unwrap();
    let metrics = GatewayMetrics::register(&registry).unwrap();
    let state = AppState::new(
        store,
        KnownProtocols::default(),
        registry,
        metrics,
        MAX_BODY_BYTES,
    );
    routes::build_router(state)
}

pub fn memory_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    (app_with(store.clone()), store)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub request_id: Option<String>,
    pub body: serde_json::Value,
}

/// Percent-encode everything outside the unreserved set.
pub fn encode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

pub fn encode_form(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    TestResponse {
        status,
        request_id,
        body,
    }
}

/// `method uri` with `form` as an urlencoded body.
pub async fn send_form(
    app: &Router,
    method: Method,
    uri: &str,
    form: &[(&str, &str)],
) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(encode_form(form)))
        .unwrap();
    send(app, request).await
}

/// Prometheus text served by `/metrics`.
pub async fn metrics_text(app: &Router) -> String {
    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}
