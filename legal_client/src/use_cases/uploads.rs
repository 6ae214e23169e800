use crate::domain::{Action, ClientError, UploadBatch, UploadedFile};
use crate::use_cases::api::{LegalApi, UploadReceipt};
use crate::use_cases::lifecycle::RequestLifecycle;

/// Upload page: the server-side file list plus one lifecycle per action.
///
/// The list is only ever replaced by a fresh fetch; successful uploads and
/// deletions trigger exactly one re-fetch instead of patching it locally.
pub struct UploadPage {
    api: LegalApi,
    files: Vec<UploadedFile>,
    listing: RequestLifecycle<(), Vec<UploadedFile>>,
    upload: RequestLifecycle<UploadBatch, UploadReceipt>,
    removal: RequestLifecycle<String, ()>,
    download: RequestLifecycle<String, Vec<u8>>,
}

impl UploadPage {
    pub async fn open(api: LegalApi) -> Result<Self, ClientError> {
        if !api.session().is_authenticated() {
            return Err(ClientError::SignInRequired);
        }
        let mut page = Self {
            api,
            files: Vec::new(),
            listing: RequestLifecycle::new(Action::LoadFiles),
            upload: RequestLifecycle::new(Action::UploadFiles),
            removal: RequestLifecycle::new(Action::DeleteFile),
            download: RequestLifecycle::new(Action::DownloadFile),
        };
        // A failed first listing is shown on the page, not raised.
        let _ = page.refresh().await;
        Ok(page)
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn listing(&self) -> &RequestLifecycle<(), Vec<UploadedFile>> {
        &self.listing
    }

    pub fn uploads(&self) -> &RequestLifecycle<UploadBatch, UploadReceipt> {
        &self.upload
    }

    pub fn removal(&self) -> &RequestLifecycle<String, ()> {
        &self.removal
    }

    /// Re-fetch the list. On failure the previous list stays visible.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let api = self.api.clone();
        let files = self
            .listing
            .submit((), |()| async move { api.list_files().await })
            .await?;
        self.files = files;
        Ok(())
    }

    pub async fn upload(&mut self, batch: UploadBatch) -> Result<UploadReceipt, ClientError> {
        if let Err(fields) = batch.validate() {
            return Err(self.upload.reject(batch, fields.into()));
        }

        let api = self.api.clone();
        let receipt = self
            .upload
            .submit(batch, |batch| async move { api.upload(&batch).await })
            .await?;
        tracing::info!(files = receipt.files, "upload complete");
        let _ = self.refresh().await;
        Ok(receipt)
    }

    pub async fn delete(&mut self, filename: &str) -> Result<(), ClientError> {
        let api = self.api.clone();
        self.removal
            .submit(filename.to_string(), |filename| async move {
                api.delete_file(&filename).await
            })
            .await?;
        let _ = self.refresh().await;
        Ok(())
    }

    pub async fn download(&mut self, filename: &str) -> Result<Vec<u8>, ClientError> {
        let api = self.api.clone();
        self.download
            .submit(filename.to_string(), |filename| async move {
                api.download_file(&filename).await
            })
            .await
    }
}
