use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;

use crate::domain::{
    Action, ApiRequest, AuthError, ClientError, Credential, CredentialStore, Identity, LoginForm,
    RegistrationForm, Session, Transport,
};
use crate::interface_adapters::protocol::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};
use crate::use_cases::api::{decode, decode_optional, json_body};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";

// Outcome of a registration. The account may exist without a signed-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub identity: Option<Identity>,
    pub authenticated: bool,
}

// Shared state behind every SessionManager clone.
struct SessionInner {
    state: RwLock<Option<Session>>,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    // Serializes state changes with their persistence so disk follows memory order.
    persist: Mutex<()>,
}

/// Owns the credential and identity of the signed-in user.
///
/// Clones share the same state. Reads never block on the network.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    pub fn signed_out(transport: Arc<dyn Transport>, store: Arc<dyn CredentialStore>) -> Self {
        Self::with_state(transport, store, None)
    }

    /// Rebuild the session from durable storage without contacting the backend.
    pub async fn restore(transport: Arc<dyn Transport>, store: Arc<dyn CredentialStore>) -> Self {
        let session = match store.load().await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "stored session unreadable; starting signed out");
                None
            }
        };
        if let Some(session) = &session {
            tracing::info!(user_id = %session.identity.id, "session restored");
        }
        Self::with_state(transport, store, session)
    }

    fn with_state(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        session: Option<Session>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                state: RwLock::new(session),
                transport,
                store,
                persist: Mutex::new(()),
            }),
        }
    }

    #[tracing::instrument(name = "login", skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        // Invalid input never reaches the network.
        LoginForm::new(email, password)
            .validate()
            .map_err(AuthError::Invalid)?;

        let body = json_body(&LoginRequest {
            email: email.trim(),
            password,
        })
        .map_err(|err| AuthError::from_client(err, Action::Login))?;
        let response = self
            .send(ApiRequest::post(LOGIN_PATH).json(body))
            .await
            .map_err(|err| AuthError::from_client(err, Action::Login))?;
        let payload: LoginResponse =
            decode(response).map_err(|err| AuthError::from_client(err, Action::Login))?;

        // Sign in only with both a credential and an identity.
        let (Some(credential), Some(identity)) = (payload.credential, payload.identity) else {
            tracing::warn!("login response lacks credential or identity");
            return Err(AuthError::Server(
                Action::Login.fallback_message().to_string(),
            ));
        };

        self.establish(Session {
            credential: Credential::new(credential),
            identity: identity.clone(),
        })
        .await;
        tracing::info!(user_id = %identity.id, "signed in");
        Ok(identity)
    }

    #[tracing::instrument(name = "register", skip_all)]
    pub async fn register(&self, form: &RegistrationForm) -> Result<Registration, AuthError> {
        form.validate().map_err(AuthError::Invalid)?;

        let body = json_body(&RegisterRequest {
            name: form.name.trim(),
            email: form.email.trim(),
            password: &form.password,
            phone: form.phone.trim(),
            city: form.city.as_deref(),
            state: form.state.as_deref(),
            country: form.country.as_deref(),
        })
        .map_err(|err| AuthError::from_client(err, Action::Register))?;
        let response = self
            .send(ApiRequest::post(REGISTER_PATH).json(body))
            .await
            .map_err(|err| AuthError::from_client(err, Action::Register))?;
        let payload: RegisterResponse = decode_optional(response)
            .map_err(|err| AuthError::from_client(err, Action::Register))?;

        // Only a response carrying both halves signs the user in.
        match (payload.credential, payload.identity) {
            (Some(credential), Some(identity)) => {
                self.establish(Session {
                    credential: Credential::new(credential),
                    identity: identity.clone(),
                })
                .await;
                tracing::info!(user_id = %identity.id, "registered and signed in");
                Ok(Registration {
                    identity: Some(identity),
                    authenticated: true,
                })
            }
            (_, identity) => {
                tracing::info!("registered; sign in required");
                Ok(Registration {
                    identity,
                    authenticated: false,
                })
            }
        }
    }

    /// Clear the session from memory and storage. Safe to call when signed out.
    pub async fn logout(&self) {
        let _persist = self.inner.persist.lock().await;
        let previous = self.write_state(None);
        if let Err(err) = self.inner.store.clear().await {
            tracing::warn!(error = %err, "failed to clear stored session");
        }
        if previous.is_some() {
            tracing::info!("signed out");
        }
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.read_state(|session| session.map(|session| session.identity.clone()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state(|session| session.is_some())
    }

    // Snapshot of the credential as of this call.
    pub fn credential(&self) -> Option<Credential> {
        self.read_state(|session| session.map(|session| session.credential.clone()))
    }

    pub fn attach_credential(&self, request: ApiRequest) -> ApiRequest {
        match self.credential() {
            Some(credential) => request.header("Authorization", credential.bearer()),
            None => request,
        }
    }

    /// Drop the session after the backend rejected `rejected`.
    ///
    /// A rejection for a credential that has since been replaced is ignored.
    pub async fn invalidate(&self, rejected: &Credential) -> bool {
        let _persist = self.inner.persist.lock().await;
        let matches = self.read_state(|session| {
            session.is_some_and(|session| &session.credential == rejected)
        });
        if !matches {
            tracing::debug!("rejection for a stale credential ignored");
            return false;
        }

        self.write_state(None);
        if let Err(err) = self.inner.store.clear().await {
            tracing::warn!(error = %err, "failed to clear stored session");
        }
        tracing::info!("session invalidated by backend");
        true
    }

    /// Swap the identity of the current session, keeping its credential.
    pub async fn replace_identity(&self, identity: Identity) -> bool {
        let _persist = self.inner.persist.lock().await;
        let Some(credential) = self.credential() else {
            return false;
        };
        let session = Session {
            credential,
            identity,
        };
        self.write_state(Some(session.clone()));
        if let Err(err) = self.inner.store.save(&session).await {
            tracing::warn!(error = %err, "failed to persist updated identity");
        }
        true
    }

    async fn establish(&self, session: Session) {
        let _persist = self.inner.persist.lock().await;
        self.write_state(Some(session.clone()));
        if let Err(err) = self.inner.store.save(&session).await {
            // The in-memory session stays usable; only the next start is affected.
            tracing::warn!(error = %err, "failed to persist session");
        }
    }

    async fn send(&self, request: ApiRequest) -> Result<crate::domain::ApiResponse, ClientError> {
        self.inner.transport.execute(request).await.map_err(|err| {
            tracing::warn!(error = %err, "transport failure");
            ClientError::from(err)
        })
    }

    fn read_state<T>(&self, read: impl FnOnce(Option<&Session>) -> T) -> T {
        let guard = self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        read(guard.as_ref())
    }

    fn write_state(&self, session: Option<Session>) -> Option<Session> {
        let mut guard = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, session)
    }
}
