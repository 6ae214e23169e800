// Public phone verification page; usable with or without a session.

use crate::domain::{Action, ClientError, FieldErrors};
use crate::use_cases::api::LegalApi;
use crate::use_cases::lifecycle::RequestLifecycle;

pub const VERIFY_FALLBACK: &str = "Verification failed";

// Verification code form and its single lifecycle.
pub struct VerifyPage {
    api: LegalApi,
    lifecycle: RequestLifecycle<String, String>,
}

impl VerifyPage {
    // Opening never touches the session or the network.
    pub fn open(api: LegalApi) -> Self {
        Self {
            api,
            lifecycle: RequestLifecycle::new(Action::VerifyPhone),
        }
    }

    pub fn lifecycle(&self) -> &RequestLifecycle<String, String> {
        &self.lifecycle
    }

    /// Check a phone verification code. A success without a message reads as a failure.
    pub async fn verify(&mut self, code: &str) -> Result<String, ClientError> {
        let code = code.trim().to_string();
        if code.is_empty() {
            let fields = FieldErrors::single("code", "Verification code is required");
            return Err(self.lifecycle.reject(code, fields.into()));
        }

        let api = self.api.clone();
        self.lifecycle
            .submit(code, |code| async move {
                api.verify_phone(&code)
                    .await
                    .map(|message| message.unwrap_or_else(|| VERIFY_FALLBACK.to_string()))
            })
            .await
    }
}
