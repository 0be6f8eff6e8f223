//! Account screen controller: profile fields, social links, avatar and paid
//! username change.
//!
//! The controller owns a local editable mirror of the account record. Each
//! write action performs a single request through its [`ActionSlot`] and
//! reconciles the mirror from the response. The most recent outcome is kept
//! as one error or success message.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::{
    domain::{AccountProfile, ProfileField, ProfileFields, SocialField, SocialLink},
    protocol::{AccountUpdateRequest, ChangeUsernameRequest, UsernameChangeResult},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    action_slot::ActionSlot,
    error::{AccountError, ApiFailure, ErrorDecoding, ValidationError},
    format::format_rupiah,
    preview::{AvatarFile, PreviewRef, PreviewStore},
    token_store::TokenProvider,
    AccountApi,
};

pub const DEFAULT_AVATAR_URL: &str = "/avatar-default.png";
pub const DEFAULT_MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;
pub const UNAUTHENTICATED_NOTICE: &str = "You must log in to manage your account.";

const USERNAME_NOT_SET: &str = "(not set)";
const LOAD_FAILED: &str = "Failed to load account.";
const SAVED: &str = "Account updated.";
const SAVE_FAILED: &str = "Failed to save account.";
const AVATAR_UPDATED: &str = "Profile photo updated.";
const AVATAR_UPLOAD_FAILED: &str = "Failed to upload avatar.";
const USERNAME_CHANGE_FAILED: &str = "Failed to change username.";

#[derive(Debug, Clone)]
pub struct AccountFormOptions {
    /// Client-side avatar size limit; `None` leaves enforcement to the server.
    pub max_avatar_bytes: Option<usize>,
}

impl Default for AccountFormOptions {
    fn default() -> Self {
        Self {
            max_avatar_bytes: Some(DEFAULT_MAX_AVATAR_BYTES),
        }
    }
}

/// Picked avatar awaiting upload, with its local preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAvatar {
    pub file: AvatarFile,
    pub preview: PreviewRef,
}

/// Snapshot of everything the account screen renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFormView {
    pub authenticated: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub profile: Option<AccountProfile>,
    pub fields: ProfileFields,
    pub social_accounts: Vec<SocialLink>,
    pub username: String,
    pub new_username: String,
    pub avatar_url: String,
    pub pending_avatar: Option<PendingAvatar>,
    pub saving: bool,
    pub avatar_uploading: bool,
    pub changing_username: bool,
}

impl AccountFormView {
    /// Preview of the pending avatar, else the confirmed URL, else the default.
    pub fn displayed_avatar(&self) -> &str {
        if let Some(pending) = &self.pending_avatar {
            return pending.preview.as_str();
        }
        if !self.avatar_url.is_empty() {
            return &self.avatar_url;
        }
        DEFAULT_AVATAR_URL
    }

    pub fn displayed_username(&self) -> &str {
        if self.username.is_empty() {
            USERNAME_NOT_SET
        } else {
            &self.username
        }
    }

    /// The body `save_profile` would send right now.
    pub fn update_request(&self) -> AccountUpdateRequest {
        AccountUpdateRequest {
            fields: self.fields.clone(),
            social_accounts: submitted_social_links(&self.social_accounts),
        }
    }

    fn apply_profile(&mut self, profile: AccountProfile) {
        self.username = profile.username.clone().unwrap_or_default();
        self.avatar_url = profile.avatar_url.clone().unwrap_or_default();
        self.fields = ProfileFields::from_profile(&profile);
        self.social_accounts = if profile.social_accounts.is_empty() {
            vec![SocialLink::default()]
        } else {
            profile.social_accounts.clone()
        };
        self.profile = Some(profile);
    }

    fn clear_messages(&mut self) {
        self.error = None;
        self.success = None;
    }

    fn set_error(&mut self, err: &AccountError) {
        self.error = Some(err.to_string());
        self.success = None;
    }

    fn set_success(&mut self, message: impl Into<String>) {
        self.success = Some(message.into());
        self.error = None;
    }
}

/// Rows with a label or a url; blank placeholder rows are never submitted.
pub fn submitted_social_links(links: &[SocialLink]) -> Vec<SocialLink> {
    links.iter().filter(|link| !link.is_blank()).cloned().collect()
}

pub fn username_changed_message(result: &UsernameChangeResult) -> String {
    format!(
        "Username changed to {}. Balance is now {}.",
        result.new_username,
        format_rupiah(result.balance)
    )
}

struct AccountFormInner {
    view: AccountFormView,
    save: ActionSlot<String>,
    avatar_upload: ActionSlot<String>,
    username_change: ActionSlot<String>,
}

pub struct AccountFormController {
    api: Arc<dyn AccountApi>,
    tokens: Arc<dyn TokenProvider>,
    previews: Arc<dyn PreviewStore>,
    options: AccountFormOptions,
    disposed: AtomicBool,
    inner: Mutex<AccountFormInner>,
}

impl AccountFormController {
    pub fn new(
        api: Arc<dyn AccountApi>,
        tokens: Arc<dyn TokenProvider>,
        previews: Arc<dyn PreviewStore>,
        options: AccountFormOptions,
    ) -> Arc<Self> {
        let authenticated = tokens.token().is_some();
        let view = AccountFormView {
            authenticated,
            loading: authenticated,
            social_accounts: vec![SocialLink::default()],
            ..AccountFormView::default()
        };
        Arc::new(Self {
            api,
            tokens,
            previews,
            options,
            disposed: AtomicBool::new(false),
            inner: Mutex::new(AccountFormInner {
                view,
                save: ActionSlot::default(),
                avatar_upload: ActionSlot::default(),
                username_change: ActionSlot::default(),
            }),
        })
    }

    pub async fn snapshot(&self) -> AccountFormView {
        let guard = self.inner.lock().await;
        let mut view = guard.view.clone();
        view.saving = guard.save.is_busy();
        view.avatar_uploading = guard.avatar_upload.is_busy();
        view.changing_username = guard.username_change.is_busy();
        view
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Tears the screen down. A load still in flight will not touch state
    /// afterwards, and the pending preview (if any) is released.
    pub async fn dispose(&self) {
        let mut guard = self.inner.lock().await;
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(pending) = guard.view.pending_avatar.take() {
            self.previews.release(&pending.preview);
        }
        debug!("account form: disposed");
    }

    fn require_token(&self) -> Result<String, AccountError> {
        self.tokens.token().ok_or(AccountError::Unauthenticated)
    }

    pub async fn load_account(&self) -> Result<(), AccountError> {
        let Some(token) = self.tokens.token() else {
            let mut guard = self.inner.lock().await;
            if self.is_disposed() {
                return Err(AccountError::Disposed);
            }
            guard.view.authenticated = false;
            guard.view.loading = false;
            return Err(AccountError::Unauthenticated);
        };

        {
            let mut guard = self.inner.lock().await;
            if self.is_disposed() {
                return Err(AccountError::Disposed);
            }
            guard.view.authenticated = true;
            guard.view.loading = true;
        }

        let result = self.api.fetch_account(&token).await;

        let mut guard = self.inner.lock().await;
        if self.is_disposed() {
            debug!("account form: discarding account response that arrived after dispose");
            return Err(AccountError::Disposed);
        }
        guard.view.loading = false;
        match result {
            Ok(profile) => {
                guard.view.apply_profile(profile);
                info!(
                    social_accounts = guard.view.social_accounts.len(),
                    "account form: account loaded"
                );
                Ok(())
            }
            Err(failure) => {
                let err = match failure {
                    ApiFailure::Status { status, .. } => AccountError::Rejected {
                        status,
                        message: LOAD_FAILED.to_string(),
                    },
                    other => other.into_account_error(ErrorDecoding::RawText, LOAD_FAILED),
                };
                warn!("account form: load failed: {err}");
                guard.view.set_error(&err);
                Err(err)
            }
        }
    }

    pub async fn set_field(&self, field: ProfileField, value: impl Into<String>) {
        self.inner.lock().await.view.fields.set(field, value);
    }

    pub async fn set_new_username(&self, value: impl Into<String>) {
        self.inner.lock().await.view.new_username = value.into();
    }

    pub async fn edit_social_link(
        &self,
        index: usize,
        field: SocialField,
        value: impl Into<String>,
    ) -> Result<(), AccountError> {
        let mut guard = self.inner.lock().await;
        let len = guard.view.social_accounts.len();
        let link = guard
            .view
            .social_accounts
            .get_mut(index)
            .ok_or(ValidationError::SocialIndexOutOfRange { index, len })?;
        link.set(field, value);
        Ok(())
    }

    pub async fn add_social_link(&self) {
        self.inner
            .lock()
            .await
            .view
            .social_accounts
            .push(SocialLink::default());
    }

    /// Removes the row at `index`. Removing the last remaining row is allowed.
    pub async fn remove_social_link(&self, index: usize) -> Result<SocialLink, AccountError> {
        let mut guard = self.inner.lock().await;
        let len = guard.view.social_accounts.len();
        if index >= len {
            return Err(ValidationError::SocialIndexOutOfRange { index, len }.into());
        }
        Ok(guard.view.social_accounts.remove(index))
    }

    /// Picks (or with `None`, clears) the avatar to upload. The previous
    /// preview is released before a new one is created.
    pub async fn select_avatar(&self, file: Option<AvatarFile>) {
        let mut guard = self.inner.lock().await;
        guard.view.clear_messages();
        self.replace_pending_avatar(&mut guard.view, file);
    }

    pub async fn cancel_avatar_selection(&self) {
        let mut guard = self.inner.lock().await;
        self.replace_pending_avatar(&mut guard.view, None);
    }

    fn replace_pending_avatar(&self, view: &mut AccountFormView, file: Option<AvatarFile>) {
        if let Some(previous) = view.pending_avatar.take() {
            self.previews.release(&previous.preview);
        }
        if let Some(file) = file {
            let preview = self.previews.create(&file);
            debug!(
                filename = %file.filename,
                size_bytes = file.len(),
                "account form: avatar selected"
            );
            view.pending_avatar = Some(PendingAvatar { file, preview });
        }
    }

    fn prepare_avatar_upload(
        &self,
        view: &AccountFormView,
    ) -> Result<(String, PendingAvatar), AccountError> {
        let pending = view
            .pending_avatar
            .clone()
            .ok_or(ValidationError::NoAvatarSelected)?;
        if let Some(max) = self.options.max_avatar_bytes {
            if pending.file.len() > max {
                return Err(ValidationError::AvatarTooLarge {
                    size: pending.file.len(),
                    max,
                }
                .into());
            }
        }
        let token = self.require_token()?;
        Ok((token, pending))
    }

    /// Uploads the pending avatar. While a previous upload is outstanding,
    /// this joins it instead of sending another request.
    pub async fn upload_avatar(self: &Arc<Self>) -> Result<String, AccountError> {
        let inflight = {
            let mut guard = self.inner.lock().await;
            match guard.avatar_upload.inflight() {
                Some(inflight) => {
                    debug!("account form: avatar upload already in flight");
                    inflight
                }
                None => {
                    guard.view.clear_messages();
                    let (token, pending) = match self.prepare_avatar_upload(&guard.view) {
                        Ok(prepared) => prepared,
                        Err(err) => {
                            debug!("account form: avatar upload rejected locally: {err}");
                            guard.view.set_error(&err);
                            return Err(err);
                        }
                    };
                    let controller = Arc::clone(self);
                    guard.avatar_upload.spawn(async move {
                        controller.run_avatar_upload(token, pending).await
                    })
                }
            }
        };
        inflight.await
    }

    async fn run_avatar_upload(
        &self,
        token: String,
        pending: PendingAvatar,
    ) -> Result<String, AccountError> {
        info!(
            filename = %pending.file.filename,
            size_bytes = pending.file.len(),
            "account form: uploading avatar"
        );
        let result = self.api.upload_avatar(&token, pending.file.clone()).await;

        let mut guard = self.inner.lock().await;
        guard.avatar_upload.finish();
        match result {
            Ok(response) => {
                if let Some(url) = response.avatar_url.filter(|url| !url.is_empty()) {
                    guard.view.avatar_url = url;
                }
                // A file picked while this upload ran stays pending.
                let uploaded_is_pending = guard
                    .view
                    .pending_avatar
                    .as_ref()
                    .is_some_and(|current| current.preview == pending.preview);
                if uploaded_is_pending {
                    guard.view.pending_avatar = None;
                    self.previews.release(&pending.preview);
                }
                guard.view.set_success(AVATAR_UPDATED);
                info!(avatar_url = %guard.view.avatar_url, "account form: avatar updated");
                Ok(AVATAR_UPDATED.to_string())
            }
            Err(failure) => {
                let err = failure.into_account_error(ErrorDecoding::RawText, AVATAR_UPLOAD_FAILED);
                warn!("account form: avatar upload failed: {err}");
                guard.view.set_error(&err);
                Err(err)
            }
        }
    }

    /// Sends the form fields and the non-blank social rows.
    pub async fn save_profile(self: &Arc<Self>) -> Result<String, AccountError> {
        let inflight = {
            let mut guard = self.inner.lock().await;
            match guard.save.inflight() {
                Some(inflight) => inflight,
                None => {
                    guard.view.clear_messages();
                    let token = match self.require_token() {
                        Ok(token) => token,
                        Err(err) => {
                            guard.view.set_error(&err);
                            return Err(err);
                        }
                    };
                    let request = guard.view.update_request();
                    let controller = Arc::clone(self);
                    guard
                        .save
                        .spawn(async move { controller.run_save(token, request).await })
                }
            }
        };
        inflight.await
    }

    async fn run_save(
        &self,
        token: String,
        request: AccountUpdateRequest,
    ) -> Result<String, AccountError> {
        info!(
            social_accounts = request.social_accounts.len(),
            "account form: saving profile"
        );
        let result = self.api.update_account(&token, &request).await;

        let mut guard = self.inner.lock().await;
        guard.save.finish();
        match result {
            Ok(()) => {
                guard.view.set_success(SAVED);
                Ok(SAVED.to_string())
            }
            Err(failure) => {
                let err = failure.into_account_error(ErrorDecoding::RawText, SAVE_FAILED);
                warn!("account form: save failed: {err}");
                guard.view.set_error(&err);
                Err(err)
            }
        }
    }

    /// Paid rename of the current account to the candidate username.
    pub async fn change_username(self: &Arc<Self>) -> Result<String, AccountError> {
        let inflight = {
            let mut guard = self.inner.lock().await;
            match guard.username_change.inflight() {
                Some(inflight) => {
                    debug!("account form: username change already in flight");
                    inflight
                }
                None => {
                    guard.view.clear_messages();
                    let candidate = guard.view.new_username.clone();
                    let prepared = if candidate.trim().is_empty() {
                        Err(ValidationError::EmptyNewUsername.into())
                    } else {
                        self.require_token()
                    };
                    let token = match prepared {
                        Ok(token) => token,
                        Err(err) => {
                            guard.view.set_error(&err);
                            return Err(err);
                        }
                    };
                    let request = ChangeUsernameRequest {
                        new_username: candidate,
                    };
                    let controller = Arc::clone(self);
                    guard.username_change.spawn(async move {
                        controller.run_change_username(token, request).await
                    })
                }
            }
        };
        inflight.await
    }

    async fn run_change_username(
        &self,
        token: String,
        request: ChangeUsernameRequest,
    ) -> Result<String, AccountError> {
        info!(new_username = %request.new_username, "account form: changing username");
        let result = self.api.change_username(&token, &request).await;

        let mut guard = self.inner.lock().await;
        guard.username_change.finish();
        match result {
            Ok(changed) => {
                let message = username_changed_message(&changed);
                guard.view.username = changed.new_username;
                guard.view.new_username.clear();
                guard.view.set_success(message.clone());
                info!(balance = changed.balance, "account form: username changed");
                Ok(message)
            }
            Err(failure) => {
                let err =
                    failure.into_account_error(ErrorDecoding::JsonThenText, USERNAME_CHANGE_FAILED);
                warn!("account form: username change failed: {err}");
                guard.view.set_error(&err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/account_form_tests.rs"]
mod tests;
