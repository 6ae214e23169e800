use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{
    ApiRequest, ApiResponse, Credential, CredentialStore, Identity, Method, Session, Transport,
    TransportError, UserId,
};
use crate::use_cases::api::LegalApi;
use crate::use_cases::session::SessionManager;

type Reply = Result<ApiResponse, TransportError>;

// Scripted replies per route plus every request seen.
#[derive(Default)]
struct Script {
    replies: HashMap<String, VecDeque<Reply>>,
    requests: Vec<ApiRequest>,
}

fn route_key(method: Method, path: &str) -> String {
    format!("{} {}", method.as_str(), path)
}

// Transport fake: replays queued replies per "METHOD /path" and records every request.
// The last queued reply for a route is sticky so repeated fetches keep answering.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        let mut guard = self.script.lock().expect("script mutex poisoned");
        guard
            .replies
            .entry(route_key(method, path))
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, Ok(ApiResponse::json(status, &body)));
    }

    pub(crate) fn respond_raw(&self, method: Method, path: &str, status: u16, body: &str) {
        self.push(method, path, Ok(ApiResponse::new(status, body)));
    }

    pub(crate) fn fail(&self, method: Method, path: &str, err: TransportError) {
        self.push(method, path, Err(err));
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        let guard = self.script.lock().expect("script mutex poisoned");
        guard.requests.clone()
    }

    pub(crate) fn count(&self, method: Method, path: &str) -> usize {
        let guard = self.script.lock().expect("script mutex poisoned");
        guard
            .requests
            .iter()
            .filter(|request| request.method == method && request.path() == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut guard = self.script.lock().expect("script mutex poisoned");
        let key = route_key(request.method, &request.path());
        guard.requests.push(request);

        let Some(queue) = guard.replies.get_mut(&key) else {
            return Ok(ApiResponse::json(
                404,
                &serde_json::json!({"detail": format!("no scripted reply for {key}")}),
            ));
        };
        if queue.len() > 1 {
            queue
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("empty script".to_string())))
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(TransportError::Other("empty script".to_string())))
        }
    }
}

// Which store operations should fail.
#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub load: bool,
    pub save: bool,
    pub clear: bool,
}

// In-memory store that can be told to fail.
#[derive(Clone, Default)]
pub(crate) struct RecordingCredentialStore {
    session: Arc<Mutex<Option<Session>>>,
    failures: FailureFlags,
}

impl RecordingCredentialStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_session(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(Some(session))),
            failures: FailureFlags::default(),
        }
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn stored(&self) -> Option<Session> {
        self.session.lock().expect("session mutex poisoned").clone()
    }
}

#[async_trait]
impl CredentialStore for RecordingCredentialStore {
    async fn load(&self) -> Result<Option<Session>, String> {
        if self.failures.load {
            return Err("load failed".to_string());
        }
        Ok(self.stored())
    }

    async fn save(&self, session: &Session) -> Result<(), String> {
        if self.failures.save {
            return Err("save failed".to_string());
        }
        *self.session.lock().expect("session mutex poisoned") = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), String> {
        if self.failures.clear {
            return Err("clear failed".to_string());
        }
        *self.session.lock().expect("session mutex poisoned") = None;
        Ok(())
    }
}

// Identity used across use case tests.
pub(crate) fn sample_identity() -> Identity {
    Identity {
        id: UserId::Numeric(1),
        name: "A".to_string(),
        email: Some("a@b.com".to_string()),
        phone: Some("555-0100".to_string()),
        created_at: Some("2024-01-15T10:30:00".to_string()),
        last_login_at: None,
    }
}

pub(crate) fn sample_session(token: &str) -> Session {
    Session {
        credential: Credential::new(token),
        identity: sample_identity(),
    }
}

// API facade restored from a stored session holding `token`.
pub(crate) async fn signed_in_api(transport: &ScriptedTransport, token: &str) -> LegalApi {
    let transport: Arc<dyn Transport> = Arc::new(transport.clone());
    let store = RecordingCredentialStore::with_session(sample_session(token));
    let session = SessionManager::restore(transport.clone(), Arc::new(store)).await;
    LegalApi::new(transport, session)
}

// API facade with no session at all.
pub(crate) async fn signed_out_api(transport: &ScriptedTransport) -> LegalApi {
    let transport: Arc<dyn Transport> = Arc::new(transport.clone());
    let session = SessionManager::signed_out(transport.clone(), Arc::new(RecordingCredentialStore::new()));
    LegalApi::new(transport, session)
}
