// In-process mock of the legal-assistance backend for integration tests.
#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use legal_client::domain::{CredentialStore, Transport};
use legal_client::interface_adapters::clients::HttpTransport;
use legal_client::use_cases::{LegalApi, SessionManager};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub const VALID_TOKEN: &str = "tok123";
pub const PASSWORD: &str = "secret1";

#[derive(Default)]
pub struct MockState {
    // Token the backend currently accepts; None means every token is rejected.
    pub accepted_token: Mutex<Option<String>>,
    pub files: Mutex<Vec<(String, Vec<u8>)>>,
    pub hits: Mutex<HashMap<String, usize>>,
    pub last_question: Mutex<Option<String>>,
}

impl MockState {
    fn hit(&self, route: &str) {
        let mut hits = self.hits.lock().expect("hits mutex poisoned");
        *hits.entry(route.to_string()).or_default() += 1;
    }

    pub fn hits(&self, route: &str) -> usize {
        let hits = self.hits.lock().expect("hits mutex poisoned");
        hits.get(route).copied().unwrap_or(0)
    }

    pub fn revoke(&self) {
        *self.accepted_token.lock().expect("token mutex poisoned") = None;
    }

    pub fn seed_file(&self, filename: &str, content: &[u8]) {
        let mut files = self.files.lock().expect("files mutex poisoned");
        files.push((filename.to_string(), content.to_vec()));
    }

    pub fn filenames(&self) -> Vec<String> {
        let files = self.files.lock().expect("files mutex poisoned");
        files.iter().map(|(name, _)| name.clone()).collect()
    }
}

// Running mock plus a handle to its state.
pub struct MockBackend {
    pub base_url: Url,
    pub state: Arc<MockState>,
}

type Shared = Arc<MockState>;

// Response for a missing or revoked bearer token.
fn rejected() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Could not validate credentials"})),
    )
        .into_response()
}

// True when the bearer token matches the one the mock accepts.
fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    let accepted = state.accepted_token.lock().expect("token mutex poisoned");
    let presented = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    matches!((accepted.as_deref(), presented), (Some(a), Some(p)) if a == p)
}

// Legacy field names (access_token, user) to exercise the aliases.
async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    state.hit("login");
    if body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid email or password"})),
        )
            .into_response();
    }
    *state.accepted_token.lock().expect("token mutex poisoned") = Some(VALID_TOKEN.to_string());
    Json(json!({
        "access_token": VALID_TOKEN,
        "token_type": "bearer",
        "user": {
            "id": 1,
            "name": "A",
            "email": body["email"],
            "phone": "555-0100",
            "created_at": "2024-01-15T10:30:00"
        }
    }))
    .into_response()
}

// Registration answers without a token, so the user must sign in.
async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    state.hit("register");
    if body["email"] == "taken@example.com" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Email already registered"})),
        )
            .into_response();
    }
    Json(json!({"message": "User created", "user": {"id": 2, "name": body["name"]}}))
        .into_response()
}

async fn ask(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    state.hit("ask");
    if !authorized(&state, &headers) {
        return rejected();
    }
    let question = body["question"].as_str().unwrap_or_default();
    Json(json!({"answer": format!("Answer to: {question}")})).into_response()
}

async fn generate(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hit("generate");
    if !authorized(&state, &headers) {
        return rejected();
    }
    let kind = body["document_type"].as_str().unwrap_or_default().to_uppercase();
    Json(json!({"generated_text": format!("{kind} between {}", body["parties"])})).into_response()
}

async fn upload(State(state): State<Shared>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    state.hit("upload");
    if !authorized(&state, &headers) {
        return rejected();
    }
    let mut question = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let Ok(bytes) = field.bytes().await else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        match (name.as_str(), filename) {
            ("files", Some(filename)) => state.seed_file(&filename, &bytes),
            ("question", _) => question = Some(String::from_utf8_lossy(&bytes).into_owned()),
            _ => {}
        }
    }
    *state.last_question.lock().expect("question mutex poisoned") = question.clone();
    let body = match question {
        Some(question) => json!({"answer": format!("About your files: {question}")}),
        None => json!({"message": "Files uploaded"}),
    };
    Json(body).into_response()
}

// Every call counts as a listing hit.
async fn list_files(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.hit("list");
    if !authorized(&state, &headers) {
        return rejected();
    }
    let files = state.files.lock().expect("files mutex poisoned");
    let listing: Vec<Value> = files
        .iter()
        .map(|(name, content)| {
            json!({"filename": name, "size": content.len(), "upload_date": "2024-03-01T09:00:00"})
        })
        .collect();
    Json(json!({ "files": listing })).into_response()
}

async fn download_file(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> Response {
    state.hit("download");
    if !authorized(&state, &headers) {
        return rejected();
    }
    let files = state.files.lock().expect("files mutex poisoned");
    match files.iter().find(|(name, _)| *name == filename) {
        Some((_, content)) => (StatusCode::OK, content.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "File not found"}))).into_response(),
    }
}

async fn delete_file(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> Response {
    state.hit("delete");
    if !authorized(&state, &headers) {
        return rejected();
    }
    let mut files = state.files.lock().expect("files mutex poisoned");
    let before = files.len();
    files.retain(|(name, _)| *name != filename);
    if files.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "File not found"}))).into_response();
    }
    Json(json!({"message": "File deleted"})).into_response()
}

async fn update_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hit("profile");
    if !authorized(&state, &headers) {
        return rejected();
    }
    if body["email"].as_str().is_some_and(|email| !email.contains('@')) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": [{"loc": ["body", "email"], "msg": "value is not a valid email address"}]})),
        )
            .into_response();
    }
    Json(json!({"message": "Profile updated"})).into_response()
}

async fn tokens(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.hit("tokens");
    if !authorized(&state, &headers) {
        return rejected();
    }
    Json(json!({"tokens": 100})).into_response()
}

// Public endpoint: a bearer token here is a client bug.
async fn verify(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hit("verify");
    if headers.contains_key("authorization") {
        return (StatusCode::BAD_REQUEST, Json(json!({"detail": "unexpected credential"})))
            .into_response();
    }
    if body["code"] == "123456" {
        Json(json!({"message": "Phone verified"})).into_response()
    } else {
        Json(json!({})).into_response()
    }
}

// Routes mirror the backend paths used by the client.
fn app(state: Shared) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/api/ask", post(ask))
        .route("/api/generate-document", post(generate))
        .route("/api/upload/", post(upload))
        .route("/api/upload/files", get(list_files))
        .route(
            "/api/upload/files/{filename}",
            get(download_file).delete(delete_file),
        )
        .route("/api/auth/profile", put(update_profile))
        .route("/api/tokens", get(tokens))
        .route("/api/verify", post(verify))
        .with_state(state)
}

// Bind an ephemeral port and serve the mock for the lifetime of the test runtime.
pub async fn spawn_backend() -> MockBackend {
    let state = Arc::new(MockState::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    let router = app(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    MockBackend {
        base_url: Url::parse(&format!("http://{addr}")).expect("valid base url"),
        state,
    }
}

pub fn transport(backend: &MockBackend) -> Arc<dyn Transport> {
    Arc::new(
        HttpTransport::new(backend.base_url.clone(), Duration::from_secs(5))
            .expect("http client should build"),
    )
}

pub async fn api(backend: &MockBackend, store: Arc<dyn CredentialStore>) -> LegalApi {
    let transport = transport(backend);
    let session = SessionManager::restore(transport.clone(), store).await;
    LegalApi::new(transport, session)
}

// Sign in through the real endpoint and return the ready API facade.
pub async fn signed_in(backend: &MockBackend, store: Arc<dyn CredentialStore>) -> LegalApi {
    let api = api(backend, store).await;
    api.session()
        .login("a@b.com", PASSWORD)
        .await
        .expect("login should succeed");
    api
}
