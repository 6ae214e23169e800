// Use cases: session management, the request lifecycle, and the page controllers.

pub mod account;
pub mod api;
pub mod ask;
pub mod documents;
pub mod lifecycle;
pub mod session;
pub mod uploads;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_support;

pub use account::{AccountInfo, DashboardPage, ProfilePage};
pub use api::{GeneratedDocument, LegalApi, UploadReceipt};
pub use ask::AskPage;
pub use documents::DocumentPage;
pub use lifecycle::{LifecycleStatus, RequestLifecycle};
pub use session::{Registration, SessionManager};
pub use uploads::UploadPage;
pub use verify::VerifyPage;
