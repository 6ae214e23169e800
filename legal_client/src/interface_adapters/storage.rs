use crate::domain::{Credential, CredentialStore, Identity, Session};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

// Fixed keys of the persisted session record.
pub const CREDENTIAL_KEY: &str = "token";
pub const IDENTITY_KEY: &str = "user";

// On-disk record: the credential plus the identity serialized as a JSON blob.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    token: String,
    user: String,
}

// JSON file credential store, read once at start-up.
#[derive(Clone, Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Session>, String> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(format!("read {}: {err}", self.path.display())),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }

        let record: StoredRecord = serde_json::from_str(&content)
            .map_err(|err| format!("parse {}: {err}", self.path.display()))?;
        let identity: Identity = serde_json::from_str(&record.user)
            .map_err(|err| format!("parse stored {IDENTITY_KEY}: {err}"))?;
        if record.token.is_empty() {
            return Ok(None);
        }

        Ok(Some(Session {
            credential: Credential::new(record.token),
            identity,
        }))
    }

    async fn save(&self, session: &Session) -> Result<(), String> {
        let user = serde_json::to_string(&session.identity)
            .map_err(|err| format!("serialize {IDENTITY_KEY}: {err}"))?;
        let record = StoredRecord {
            token: session.credential.as_str().to_string(),
            user,
        };
        let content = serde_json::to_string_pretty(&record)
            .map_err(|err| format!("serialize session: {err}"))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| format!("create {}: {err}", parent.display()))?;
        }

        // Write a sibling file and rename it so readers never see a partial record.
        let temp = self.temp_path();
        tokio::fs::write(&temp, content)
            .await
            .map_err(|err| format!("write {}: {err}", temp.display()))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|err| format!("rename to {}: {err}", self.path.display()))
    }

    async fn clear(&self) -> Result<(), String> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(format!("remove {}: {err}", self.path.display())),
        }
    }
}

// In-memory store for ephemeral sessions.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    pub session: Arc<Mutex<Option<Session>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(Some(session))),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> Result<Option<Session>, String> {
        Ok(self.session.lock().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<(), String> {
        *self.session.lock().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), String> {
        *self.session.lock().await = None;
        Ok(())
    }
}
