// Domain layer: entities, forms, errors and the ports the use cases depend on.

pub mod entities;
pub mod errors;
pub mod forms;
pub mod ports;
pub mod request;

// Re-export the domain boundary types and ports.
pub use entities::{
    Credential, Identity, Message, Sender, Session, UploadedFile, UserId, format_file_size,
};
pub use errors::{Action, AuthError, ClientError, FieldErrors, TransportError};
pub use forms::{
    DocumentField, DocumentFields, DocumentKind, DocumentRequest, LoginForm, ProfileForm,
    RegistrationForm, UploadBatch,
};
pub use ports::{CredentialStore, Transport};
pub use request::{ApiRequest, ApiResponse, FormPart, Method, RequestBody, UploadFile};
