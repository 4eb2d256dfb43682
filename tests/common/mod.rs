//! Local stand-ins for the realtime database, the metadata server and the
//! Telegram Bot API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

use expense_tracker_bot::expenses::Messenger;

pub const DB_TOKEN: &str = "test-token";

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// =============================================================================
// DATABASE
// =============================================================================

/// In-memory `/summary/{id}.json` documents, readable and writable with
/// `?access_token=<token>`.
#[derive(Clone)]
pub struct FakeDatabase {
    records: Arc<Mutex<HashMap<String, Value>>>,
    token: String,
    puts: Arc<AtomicUsize>,
}

impl FakeDatabase {
    pub fn new(token: &str) -> Self {
        Self {
            records: Arc::default(),
            token: token.to_string(),
            puts: Arc::default(),
        }
    }

    pub fn insert(&self, user_id: i64, cents: i64) {
        self.records
            .lock()
            .unwrap()
            .insert(format!("{user_id}.json"), json!({ "amountInCents": cents }));
    }

    pub fn insert_raw(&self, user_id: i64, value: Value) {
        self.records.lock().unwrap().insert(format!("{user_id}.json"), value);
    }

    pub fn amount(&self, user_id: i64) -> Option<i64> {
        self.records
            .lock()
            .unwrap()
            .get(&format!("{user_id}.json"))
            .and_then(|v| v["amountInCents"].as_i64())
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Serve on an ephemeral port and return the base URL.
    pub async fn serve(&self) -> String {
        let app = Router::new()
            .route("/summary/{file}", get(read_record).put(write_record))
            .with_state(self.clone());
        format!("http://{}", spawn(app).await)
    }

    fn authorized(&self, query: &HashMap<String, String>) -> bool {
        query.get("access_token") == Some(&self.token)
    }
}

fn permission_denied() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Permission denied" }))).into_response()
}

async fn read_record(
    State(db): State<FakeDatabase>,
    Path(file): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !db.authorized(&query) {
        return permission_denied();
    }
    let value = db.records.lock().unwrap().get(&file).cloned().unwrap_or(Value::Null);
    Json(value).into_response()
}

async fn write_record(
    State(db): State<FakeDatabase>,
    Path(file): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if !db.authorized(&query) {
        return permission_denied();
    }
    db.puts.fetch_add(1, Ordering::SeqCst);
    db.records.lock().unwrap().insert(file, body.clone());
    Json(body).into_response()
}

// =============================================================================
// METADATA SERVER
// =============================================================================

/// Issues `token-<n>` for the n-th request, with a fixed lifetime.
#[derive(Clone)]
pub struct FakeMetadata {
    issued: Arc<AtomicUsize>,
    expires_in: i64,
    status: StatusCode,
}

impl FakeMetadata {
    pub fn new(expires_in: i64) -> Self {
        Self {
            issued: Arc::default(),
            expires_in,
            status: StatusCode::OK,
        }
    }

    pub fn failing(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::new(3600)
        }
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    pub async fn serve(&self) -> String {
        let app = Router::new()
            .route(
                "/computeMetadata/v1/instance/service-accounts/default/token",
                get(issue_token),
            )
            .with_state(self.clone());
        format!("http://{}", spawn(app).await)
    }
}

async fn issue_token(
    State(meta): State<FakeMetadata>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if headers.get("Metadata-Flavor").and_then(|v| v.to_str().ok()) != Some("Google") {
        return (StatusCode::FORBIDDEN, "missing Metadata-Flavor").into_response();
    }
    if !query
        .get("scopes")
        .is_some_and(|s| s.contains("https://www.googleapis.com/auth/firebase.database"))
    {
        return (StatusCode::BAD_REQUEST, "missing scopes").into_response();
    }
    if meta.status != StatusCode::OK {
        return (meta.status, "unavailable").into_response();
    }
    let n = meta.issued.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({
        "access_token": format!("token-{n}"),
        "expires_in": meta.expires_in,
        "token_type": "Bearer"
    }))
    .into_response()
}

// =============================================================================
// TELEGRAM BOT API
// =============================================================================

/// Records every Bot API call as `(method, json body)`.
#[derive(Clone, Default)]
pub struct FakeTelegram {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    reject: bool,
}

impl FakeTelegram {
    /// Answers every call with `ok: false`.
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn serve(&self) -> String {
        let app = Router::new()
            .route("/{bot}/{method}", post(bot_api_call))
            .with_state(self.clone());
        format!("http://{}", spawn(app).await)
    }
}

async fn bot_api_call(
    State(api): State<FakeTelegram>,
    Path((_bot, method)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    api.calls.lock().unwrap().push((method.clone(), body.clone()));
    if api.reject {
        return Json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        }))
        .into_response();
    }

    let result = if method.eq_ignore_ascii_case("sendMessage") {
        json!({
            "message_id": 1,
            "date": 1638299653,
            "chat": { "id": body["chat_id"], "type": "private", "first_name": "test" },
            "text": body["text"]
        })
    } else {
        json!(true)
    };
    Json(json!({ "ok": true, "result": result })).into_response()
}

// =============================================================================
// MESSENGER
// =============================================================================

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<(i64, String)>>,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(&self, user_id: i64, text: &str) -> Result<(), String> {
        self.sent.lock().unwrap().push((user_id, text.to_string()));
        Ok(())
    }
}
