use crate::domain::{Action, ClientError, DocumentRequest};
use crate::use_cases::api::{GeneratedDocument, LegalApi};
use crate::use_cases::lifecycle::RequestLifecycle;

// Document generation page.
pub struct DocumentPage {
    api: LegalApi,
    lifecycle: RequestLifecycle<DocumentRequest, GeneratedDocument>,
}

impl DocumentPage {
    pub fn open(api: LegalApi) -> Result<Self, ClientError> {
        if !api.session().is_authenticated() {
            return Err(ClientError::SignInRequired);
        }
        Ok(Self {
            api,
            lifecycle: RequestLifecycle::new(Action::GenerateDocument),
        })
    }

    pub fn lifecycle(&self) -> &RequestLifecycle<DocumentRequest, GeneratedDocument> {
        &self.lifecycle
    }

    pub fn document(&self) -> Option<&GeneratedDocument> {
        self.lifecycle.result()
    }

    pub async fn generate(
        &mut self,
        request: DocumentRequest,
    ) -> Result<GeneratedDocument, ClientError> {
        if let Err(fields) = request.validate() {
            return Err(self.lifecycle.reject(request, fields.into()));
        }

        let api = self.api.clone();
        self.lifecycle
            .submit(request, |request| async move {
                api.generate_document(&request).await
            })
            .await
    }

    pub fn reset(&mut self) {
        self.lifecycle.reset();
    }
}
