// Profile and dashboard pages.

use crate::domain::{Action, ClientError, Identity, ProfileForm};
use crate::use_cases::api::LegalApi;
use crate::use_cases::lifecycle::RequestLifecycle;

// Read-only account facts shown next to the profile form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub user_id: String,
    pub member_since: Option<String>,
    pub last_login: Option<String>,
}

impl AccountInfo {
    fn from_identity(identity: &Identity) -> Self {
        Self {
            user_id: identity.id.to_string(),
            member_since: identity.created_at.clone(),
            last_login: identity.last_seen().map(str::to_string),
        }
    }
}

// Profile form seeded from the signed-in identity.
pub struct ProfilePage {
    api: LegalApi,
    form: ProfileForm,
    lifecycle: RequestLifecycle<ProfileForm, ()>,
}

impl ProfilePage {
    /// Open the page with the form pre-filled from the signed-in identity.
    pub fn open(api: LegalApi) -> Result<Self, ClientError> {
        let identity = api
            .session()
            .current_identity()
            .ok_or(ClientError::SignInRequired)?;
        let form = ProfileForm {
            name: identity.name.clone(),
            email: identity.email.clone().unwrap_or_default(),
            phone: identity.phone.clone().unwrap_or_default(),
        };
        Ok(Self {
            api,
            form,
            lifecycle: RequestLifecycle::new(Action::UpdateProfile),
        })
    }

    pub fn form(&self) -> &ProfileForm {
        &self.form
    }

    pub fn lifecycle(&self) -> &RequestLifecycle<ProfileForm, ()> {
        &self.lifecycle
    }

    pub fn account_info(&self) -> Option<AccountInfo> {
        self.api
            .session()
            .current_identity()
            .map(|identity| AccountInfo::from_identity(&identity))
    }

    /// Submit the form; the stored identity changes only after the backend accepts it.
    pub async fn save(&mut self, form: ProfileForm) -> Result<(), ClientError> {
        if let Err(fields) = form.validate() {
            return Err(self.lifecycle.reject(form, fields.into()));
        }

        let api = self.api.clone();
        self.lifecycle
            .submit(form.clone(), |form| async move {
                api.update_profile(&form).await
            })
            .await?;

        if let Some(identity) = self.api.session().current_identity() {
            let updated = Identity {
                name: form.name.trim().to_string(),
                email: Some(form.email.trim().to_string()),
                phone: Some(form.phone.trim().to_string()),
                ..identity
            };
            self.api.session().replace_identity(updated).await;
        }
        self.form = form;
        Ok(())
    }

    pub async fn logout(&self) {
        self.api.session().logout().await;
    }
}

// Signed-in landing page showing the token balance.
pub struct DashboardPage {
    api: LegalApi,
    tokens: RequestLifecycle<(), u64>,
}

impl DashboardPage {
    pub async fn open(api: LegalApi) -> Result<Self, ClientError> {
        if !api.session().is_authenticated() {
            return Err(ClientError::SignInRequired);
        }
        let mut page = Self {
            api,
            tokens: RequestLifecycle::new(Action::LoadTokens),
        };
        let _ = page.refresh_tokens().await;
        Ok(page)
    }

    pub fn tokens(&self) -> &RequestLifecycle<(), u64> {
        &self.tokens
    }

    pub async fn refresh_tokens(&mut self) -> Result<u64, ClientError> {
        let api = self.api.clone();
        self.tokens
            .submit((), |()| async move { api.token_balance().await })
            .await
    }
}
