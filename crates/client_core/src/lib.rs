use async_trait::async_trait;
use shared::{
    domain::AccountProfile,
    protocol::{
        AccountUpdateRequest, AvatarUploadResponse, ChangeUsernameRequest, SetUsernameRequest,
        UsernameChangeResult,
    },
};

pub mod account_form;
pub mod action_slot;
pub mod error;
pub mod format;
pub mod http;
pub mod preview;
pub mod token_store;
pub mod username_setup;

pub use account_form::{AccountFormController, AccountFormOptions, AccountFormView};
pub use error::{AccountError, ApiFailure, ValidationError};
pub use http::HttpAccountApi;
pub use preview::{AvatarFile, InMemoryPreviewStore, PreviewRef, PreviewStore};
pub use token_store::{FileTokenStore, InMemoryTokenStore, TokenProvider};
pub use username_setup::{UsernameSetupController, UsernameSetupView};

/// Remote account endpoints. Every call carries the caller's bearer token.
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn fetch_account(&self, token: &str) -> Result<AccountProfile, ApiFailure>;
    async fn update_account(
        &self,
        token: &str,
        request: &AccountUpdateRequest,
    ) -> Result<(), ApiFailure>;
    async fn upload_avatar(
        &self,
        token: &str,
        file: AvatarFile,
    ) -> Result<AvatarUploadResponse, ApiFailure>;
    async fn change_username(
        &self,
        token: &str,
        request: &ChangeUsernameRequest,
    ) -> Result<UsernameChangeResult, ApiFailure>;
    async fn set_initial_username(
        &self,
        token: &str,
        request: &SetUsernameRequest,
    ) -> Result<(), ApiFailure>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
