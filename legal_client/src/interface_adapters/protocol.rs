use crate::domain::{Identity, UploadedFile};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Request payload for email/password login.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

// Login response. Older backends name the fields access_token/token and user.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "access_token", alias = "token")]
    pub credential: Option<String>,
    #[serde(alias = "user")]
    pub identity: Option<Identity>,
}

// Request payload for account registration.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub phone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<&'a str>,
}

// Registration may return the new identity, a credential, both, or neither.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterResponse {
    #[serde(default, alias = "access_token", alias = "token")]
    pub credential: Option<String>,
    #[serde(default, alias = "user")]
    pub identity: Option<Identity>,
}

// Request payload for a legal question.
#[derive(Debug, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
}

// Answer to a legal question.
#[derive(Debug, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

// Request payload for document generation; optional fields are omitted.
#[derive(Debug, Serialize)]
pub struct GenerateDocumentRequest<'a> {
    pub document_type: &'a str,
    pub parties: &'a str,
    pub subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<&'a str>,
}

// Generated document text. Older backends call it generated_text.
#[derive(Debug, Deserialize)]
pub struct GenerateDocumentResponse {
    #[serde(alias = "generated_text")]
    pub document: String,
}

// Upload result; carries an answer when a question was attached.
#[derive(Debug, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub answer: Option<String>,
}

// Files uploaded by the signed-in user.
#[derive(Debug, Deserialize)]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<UploadedFile>,
}

// Request payload for a profile update.
#[derive(Debug, Serialize)]
pub struct ProfileUpdateRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
}

// Remaining token balance.
#[derive(Debug, Deserialize)]
pub struct TokenBalanceResponse {
    pub tokens: u64,
}

// Phone verification code.
#[derive(Debug, Serialize)]
pub struct VerifyRequest<'a> {
    pub code: &'a str,
}

// Verification outcome; the message may be missing.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// Error envelope. `detail` is either a plain string or a list of field issues.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// Shapes `detail` takes across backend versions.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Text(String),
    Fields(Vec<FieldIssue>),
    Other(Value),
}

// One validation issue from a 422 response.
#[derive(Debug, Deserialize)]
pub struct FieldIssue {
    #[serde(default)]
    pub loc: Vec<Value>,
    pub msg: String,
}

impl FieldIssue {
    // The field name is the last string component of the location path.
    pub fn field(&self) -> String {
        self.loc
            .iter()
            .rev()
            .find_map(Value::as_str)
            .unwrap_or("form")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn when_login_response_uses_access_token_then_alias_is_accepted() {
        let response: LoginResponse = serde_json::from_value(json!({
            "access_token": "tok123",
            "token_type": "bearer",
            "user": {"id": 1, "name": "A"}
        }))
        .expect("expected login response");

        assert_eq!(response.credential.as_deref(), Some("tok123"));
        assert_eq!(response.identity.map(|identity| identity.name), Some("A".to_string()));
    }

    #[test]
    fn when_document_response_uses_generated_text_then_alias_is_accepted() {
        let response: GenerateDocumentResponse =
            serde_json::from_value(json!({"generated_text": "THIS AGREEMENT"}))
                .expect("expected document response");

        assert_eq!(response.document, "THIS AGREEMENT");
    }

    #[test]
    fn when_detail_is_field_list_then_issues_name_their_fields() {
        let response: ErrorResponse = serde_json::from_value(json!({
            "detail": [
                {"loc": ["body", "email"], "msg": "value is not a valid email address", "type": "value_error"},
                {"loc": ["body", 0], "msg": "bad item", "type": "value_error"}
            ]
        }))
        .expect("expected error response");

        let Some(ErrorDetail::Fields(issues)) = response.detail else {
            panic!("expected field issues");
        };
        assert_eq!(issues[0].field(), "email");
        assert_eq!(issues[1].field(), "body");
    }

    #[test]
    fn when_generate_request_has_no_optionals_then_they_are_omitted() {
        let body = serde_json::to_value(GenerateDocumentRequest {
            document_type: "nda",
            parties: "A and B",
            subject: "Prototype",
            terms: None,
            duration: None,
            amount: None,
        })
        .expect("expected json");

        assert_eq!(
            body,
            json!({"document_type": "nda", "parties": "A and B", "subject": "Prototype"})
        );
    }
}
