use thiserror::Error;

// Per-field validation messages, in the order the checks ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(String, String)>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    // Only the first message per field is kept, matching inline form display.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        if self.get(&field).is_none() {
            self.0.push((field, message.into()));
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }

    pub fn first_message(&self) -> Option<&str> {
        self.0.first().map(|(_, message)| message.as_str())
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

// User actions, used to pick the static fallback message for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Register,
    AskQuestion,
    GenerateDocument,
    UploadFiles,
    LoadFiles,
    DownloadFile,
    DeleteFile,
    UpdateProfile,
    LoadTokens,
    VerifyPhone,
}

impl Action {
    pub fn fallback_message(self) -> &'static str {
        match self {
            Action::Login => "Login failed",
            Action::Register => "Registration failed",
            Action::AskQuestion => "Error while asking question.",
            Action::GenerateDocument => "Failed to generate document.",
            Action::UploadFiles => "Failed to upload files",
            Action::LoadFiles => "Failed to load files",
            Action::DownloadFile => "Failed to download file",
            Action::DeleteFile => "Failed to delete file",
            Action::UpdateProfile => "Failed to update profile",
            Action::LoadTokens => "Failed to load token balance",
            Action::VerifyPhone => "Verification failed",
        }
    }
}

// Failures below HTTP: the request never produced a status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Other(String),
}

// Failure taxonomy shared by every API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("authentication rejected with status {status}")]
    AuthRejected { status: u16, message: Option<String> },
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("request rejected with status {status}")]
    Rejected {
        status: u16,
        detail: Option<String>,
        message: Option<String>,
    },
    #[error("server error: {reason}")]
    Server { status: Option<u16>, reason: String },
    #[error("a request is already in flight")]
    GuardViolation,
    #[error("sign in required")]
    SignInRequired,
}

impl ClientError {
    /// Text safe to show the user for this failure of `action`.
    pub fn user_message(&self, action: Action) -> String {
        let fallback = action.fallback_message();
        match self {
            ClientError::AuthRejected { message, .. } => {
                message.clone().unwrap_or_else(|| fallback.to_string())
            }
            ClientError::Validation(fields) => fields
                .first_message()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
            ClientError::Rejected {
                detail, message, ..
            } => detail
                .clone()
                .or_else(|| message.clone())
                .unwrap_or_else(|| fallback.to_string()),
            ClientError::SignInRequired => "Please sign in to continue.".to_string(),
            ClientError::Network(_) | ClientError::Server { .. } | ClientError::GuardViolation => {
                fallback.to_string()
            }
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ClientError::Validation(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Network(err.to_string())
    }
}

impl From<FieldErrors> for ClientError {
    fn from(fields: FieldErrors) -> Self {
        ClientError::Validation(fields)
    }
}

// Login/registration failures as seen by the session manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("invalid input")]
    Invalid(FieldErrors),
    #[error("{0}")]
    Server(String),
}

impl AuthError {
    pub fn from_client(err: ClientError, action: Action) -> Self {
        let message = err.user_message(action);
        match err {
            ClientError::Network(reason) => AuthError::Network(reason),
            ClientError::Validation(fields) => AuthError::Invalid(fields),
            ClientError::AuthRejected { status, .. } | ClientError::Rejected { status, .. } => {
                AuthError::Rejected { status, message }
            }
            ClientError::Server { .. } | ClientError::GuardViolation | ClientError::SignInRequired => {
                AuthError::Server(action.fallback_message().to_string())
            }
        }
    }

    pub fn user_message(&self, action: Action) -> String {
        match self {
            AuthError::Network(_) => action.fallback_message().to_string(),
            AuthError::Rejected { message, .. } => message.clone(),
            AuthError::Invalid(fields) => fields
                .first_message()
                .unwrap_or(action.fallback_message())
                .to_string(),
            AuthError::Server(message) => message.clone(),
        }
    }
}
