// Typed calls against the legal-assistance backend, one per user action.

use crate::domain::{
    ApiRequest, ApiResponse, ClientError, DocumentKind, DocumentRequest, FieldErrors, FormPart,
    ProfileForm, Transport, UploadBatch, UploadedFile,
};
use crate::interface_adapters::protocol::{
    AskRequest, AskResponse, ErrorDetail, ErrorResponse, FileListResponse,
    GenerateDocumentRequest, GenerateDocumentResponse, ProfileUpdateRequest,
    TokenBalanceResponse, UploadResponse, VerifyRequest, VerifyResponse,
};
use crate::use_cases::session::SessionManager;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub const ASK_PATH: &str = "/api/ask";
pub const GENERATE_DOCUMENT_PATH: &str = "/api/generate-document";
pub const UPLOAD_PATH: &str = "/api/upload/";
pub const FILES_PATH: &str = "/api/upload/files";
pub const PROFILE_PATH: &str = "/api/auth/profile";
pub const TOKENS_PATH: &str = "/api/tokens";
pub const VERIFY_PATH: &str = "/api/verify";

// Generated document text and the kind it was requested as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub kind: DocumentKind,
    pub text: String,
}

impl GeneratedDocument {
    pub fn suggested_filename(&self) -> String {
        format!("{}_document.txt", self.kind.slug())
    }
}

// Result of one upload submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReceipt {
    pub files: usize,
    pub answer: Option<String>,
}

// Serialize an outgoing payload.
pub(crate) fn json_body<T: Serialize>(payload: &T) -> Result<serde_json::Value, ClientError> {
    serde_json::to_value(payload).map_err(|err| ClientError::Server {
        status: None,
        reason: format!("encode request: {err}"),
    })
}

// Map a non-2xx response onto the error taxonomy.
pub(crate) fn classify_failure(response: &ApiResponse) -> ClientError {
    let payload: ErrorResponse = response.parse().unwrap_or_default();
    let message = payload.message.or(payload.error);
    let mut detail = None;
    let mut fields = FieldErrors::new();
    match payload.detail {
        Some(ErrorDetail::Text(text)) => detail = Some(text),
        Some(ErrorDetail::Fields(issues)) => {
            for issue in issues {
                fields.push(issue.field(), issue.msg);
            }
        }
        Some(ErrorDetail::Other(_)) | None => {}
    }

    let status = response.status;
    match status {
        401 | 403 => ClientError::AuthRejected {
            status,
            message: detail.or(message),
        },
        400..=499 if !fields.is_empty() => ClientError::Validation(fields),
        400..=499 => ClientError::Rejected {
            status,
            detail,
            message,
        },
        _ => ClientError::Server {
            status: Some(status),
            reason: detail
                .or(message)
                .unwrap_or_else(|| format!("unexpected status {status}")),
        },
    }
}

// Check the status, then decode the JSON body.
pub(crate) fn decode<T: DeserializeOwned>(response: ApiResponse) -> Result<T, ClientError> {
    if !response.is_success() {
        return Err(classify_failure(&response));
    }
    response.parse().map_err(|err| ClientError::Server {
        status: Some(response.status),
        reason: format!("malformed response: {err}"),
    })
}

// Pass 2xx responses through; classify everything else.
pub(crate) fn expect_success(response: ApiResponse) -> Result<ApiResponse, ClientError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(classify_failure(&response))
    }
}

// Decode a body that may legitimately be empty.
pub(crate) fn decode_optional<T: DeserializeOwned + Default>(
    response: ApiResponse,
) -> Result<T, ClientError> {
    let response = expect_success(response)?;
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    decode(response)
}

// Facade over the transport that injects the session credential.
#[derive(Clone)]
pub struct LegalApi {
    transport: Arc<dyn Transport>,
    session: SessionManager,
}

impl LegalApi {
    pub fn new(transport: Arc<dyn Transport>, session: SessionManager) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    // The credential is snapshotted here, before dispatch; a logout while the
    // call is in flight does not alter the request already sent.
    async fn send_authenticated(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let Some(credential) = self.session.credential() else {
            tracing::debug!(path = %request.path(), "no credential; sign in required");
            return Err(ClientError::SignInRequired);
        };
        let request = request.header("Authorization", credential.bearer());

        let response = self.transport.execute(request).await.map_err(|err| {
            tracing::warn!(error = %err, "transport failure");
            ClientError::from(err)
        })?;

        if response.is_auth_rejection() {
            tracing::warn!(status = response.status, "credential rejected by backend");
            self.session.invalidate(&credential).await;
        }
        Ok(response)
    }

    async fn send_anonymous(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        self.transport.execute(request).await.map_err(|err| {
            tracing::warn!(error = %err, "transport failure");
            ClientError::from(err)
        })
    }

    #[tracing::instrument(name = "ask_question", skip_all)]
    pub async fn ask(&self, question: &str) -> Result<String, ClientError> {
        let body = json_body(&AskRequest { question })?;
        let response = self
            .send_authenticated(ApiRequest::post(ASK_PATH).json(body))
            .await?;
        let answer: AskResponse = decode(response)?;
        Ok(answer.answer)
    }

    #[tracing::instrument(name = "generate_document", skip_all, fields(kind = request.kind.slug()))]
    pub async fn generate_document(
        &self,
        request: &DocumentRequest,
    ) -> Result<GeneratedDocument, ClientError> {
        let fields = &request.fields;
        let body = json_body(&GenerateDocumentRequest {
            document_type: request.kind.slug(),
            parties: &fields.parties,
            subject: &fields.subject,
            terms: fields.terms.as_deref(),
            duration: fields.duration.as_deref(),
            amount: fields.amount.as_deref(),
        })?;
        let response = self
            .send_authenticated(ApiRequest::post(GENERATE_DOCUMENT_PATH).json(body))
            .await?;
        let generated: GenerateDocumentResponse = decode(response)?;
        Ok(GeneratedDocument {
            kind: request.kind,
            text: generated.document,
        })
    }

    #[tracing::instrument(name = "upload_files", skip_all, fields(files = batch.files.len()))]
    pub async fn upload(&self, batch: &UploadBatch) -> Result<UploadReceipt, ClientError> {
        let mut parts: Vec<FormPart> = batch
            .files
            .iter()
            .map(|file| FormPart::File {
                name: "files".to_string(),
                file: file.clone(),
            })
            .collect();
        if let Some(question) = &batch.question {
            parts.push(FormPart::Text {
                name: "question".to_string(),
                value: question.clone(),
            });
        }

        let response = self
            .send_authenticated(ApiRequest::post(UPLOAD_PATH).multipart(parts))
            .await?;
        let uploaded: UploadResponse = decode_optional(response)?;
        Ok(UploadReceipt {
            files: batch.files.len(),
            answer: uploaded.answer,
        })
    }

    #[tracing::instrument(name = "list_files", skip_all)]
    pub async fn list_files(&self) -> Result<Vec<UploadedFile>, ClientError> {
        let response = self.send_authenticated(ApiRequest::get(FILES_PATH)).await?;
        let listing: FileListResponse = decode(response)?;
        Ok(listing.files)
    }

    #[tracing::instrument(name = "download_file", skip(self))]
    pub async fn download_file(&self, filename: &str) -> Result<Vec<u8>, ClientError> {
        let response = self
            .send_authenticated(ApiRequest::get(FILES_PATH).segment(filename))
            .await?;
        Ok(expect_success(response)?.body)
    }

    #[tracing::instrument(name = "delete_file", skip(self))]
    pub async fn delete_file(&self, filename: &str) -> Result<(), ClientError> {
        let response = self
            .send_authenticated(ApiRequest::delete(FILES_PATH).segment(filename))
            .await?;
        expect_success(response)?;
        Ok(())
    }

    #[tracing::instrument(name = "update_profile", skip_all)]
    pub async fn update_profile(&self, form: &ProfileForm) -> Result<(), ClientError> {
        let body = json_body(&ProfileUpdateRequest {
            name: &form.name,
            email: &form.email,
            phone: &form.phone,
        })?;
        let response = self
            .send_authenticated(ApiRequest::put(PROFILE_PATH).json(body))
            .await?;
        expect_success(response)?;
        Ok(())
    }

    #[tracing::instrument(name = "token_balance", skip_all)]
    pub async fn token_balance(&self) -> Result<u64, ClientError> {
        let response = self.send_authenticated(ApiRequest::get(TOKENS_PATH)).await?;
        let balance: TokenBalanceResponse = decode(response)?;
        Ok(balance.tokens)
    }

    // Phone verification is not behind the session credential.
    #[tracing::instrument(name = "verify_phone", skip_all)]
    pub async fn verify_phone(&self, code: &str) -> Result<Option<String>, ClientError> {
        let body = json_body(&VerifyRequest { code })?;
        let response = self
            .send_anonymous(ApiRequest::post(VERIFY_PATH).json(body))
            .await?;
        let verified: VerifyResponse = decode_optional(response)?;
        Ok(verified.message)
    }
}
