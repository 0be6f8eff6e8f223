use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::AccountProfile,
    protocol::{
        AccountUpdateRequest, AvatarUploadResponse, ChangeUsernameRequest, SetUsernameRequest,
        UsernameChangeResult, ACCOUNT_AVATAR_PATH, ACCOUNT_ME_PATH, ACCOUNT_PATH,
        AVATAR_FORM_FIELD, CHANGE_USERNAME_PATH, SET_USERNAME_PATH,
    },
};
use tracing::{debug, warn};

use crate::{error::ApiFailure, preview::AvatarFile, AccountApi};

const DEFAULT_AVATAR_MIME: &str = "application/octet-stream";

/// [`AccountApi`] over HTTP with bearer-token authorization.
#[derive(Debug, Clone)]
pub struct HttpAccountApi {
    http: Client,
    base_url: String,
}

impl HttpAccountApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiFailure> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "account api: request rejected");
    Err(ApiFailure::Status {
        status: status.as_u16(),
        body,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiFailure> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|err| ApiFailure::Decode(err.to_string()))
}

#[async_trait]
impl AccountApi for HttpAccountApi {
    async fn fetch_account(&self, token: &str) -> Result<AccountProfile, ApiFailure> {
        debug!("account api: GET {ACCOUNT_ME_PATH}");
        let response = self
            .http
            .get(self.url(ACCOUNT_ME_PATH))
            .bearer_auth(token)
            .send()
            .await?;
        read_json(ensure_success(response).await?).await
    }

    async fn update_account(
        &self,
        token: &str,
        request: &AccountUpdateRequest,
    ) -> Result<(), ApiFailure> {
        debug!(
            social_accounts = request.social_accounts.len(),
            "account api: PUT {ACCOUNT_PATH}"
        );
        let response = self
            .http
            .put(self.url(ACCOUNT_PATH))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn upload_avatar(
        &self,
        token: &str,
        file: AvatarFile,
    ) -> Result<AvatarUploadResponse, ApiFailure> {
        debug!(
            filename = %file.filename,
            size_bytes = file.len(),
            "account api: PUT {ACCOUNT_AVATAR_PATH}"
        );
        let mime_type = file
            .mime_type
            .clone()
            .unwrap_or_else(|| DEFAULT_AVATAR_MIME.to_string());
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.filename.clone())
            .mime_str(&mime_type)?;
        let form = multipart::Form::new().part(AVATAR_FORM_FIELD, part);

        let response = self
            .http
            .put(self.url(ACCOUNT_AVATAR_PATH))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;
        // Success bodies that are not JSON carry no new URL.
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }

    async fn change_username(
        &self,
        token: &str,
        request: &ChangeUsernameRequest,
    ) -> Result<UsernameChangeResult, ApiFailure> {
        debug!("account api: POST {CHANGE_USERNAME_PATH}");
        let response = self
            .http
            .post(self.url(CHANGE_USERNAME_PATH))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        read_json(ensure_success(response).await?).await
    }

    async fn set_initial_username(
        &self,
        token: &str,
        request: &SetUsernameRequest,
    ) -> Result<(), ApiFailure> {
        debug!("account api: POST {SET_USERNAME_PATH}");
        let response = self
            .http
            .post(self.url(SET_USERNAME_PATH))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
