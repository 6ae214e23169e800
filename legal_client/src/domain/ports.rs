use async_trait::async_trait;

use crate::domain::entities::Session;
use crate::domain::errors::TransportError;
use crate::domain::request::{ApiRequest, ApiResponse};

// The use cases depend on these traits, not on reqwest or the filesystem.
// Dependencies point inwards to the domain layer.

// Port for issuing one request against the legal-assistance backend.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

// Port for durable credential storage read back on process start.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, String>;
    async fn save(&self, session: &Session) -> Result<(), String>;
    async fn clear(&self) -> Result<(), String>;
}
