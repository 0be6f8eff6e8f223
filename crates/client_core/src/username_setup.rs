//! First-time username setup screen.

use std::sync::Arc;

use shared::protocol::SetUsernameRequest;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    action_slot::ActionSlot,
    error::{AccountError, ErrorDecoding, ValidationError},
    token_store::TokenProvider,
    AccountApi,
};

pub const MAX_USERNAME_CHARS: usize = 64;

const USERNAME_CREATED: &str = "Username created. You can now start using all features.";
const SET_USERNAME_FAILED: &str = "Failed to save username.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsernameSetupView {
    pub username: String,
    pub submitting: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

struct UsernameSetupInner {
    view: UsernameSetupView,
    submit: ActionSlot<String>,
}

pub struct UsernameSetupController {
    api: Arc<dyn AccountApi>,
    tokens: Arc<dyn TokenProvider>,
    inner: Mutex<UsernameSetupInner>,
}

/// Trims `raw` and applies the local rules: non-empty, at most
/// [`MAX_USERNAME_CHARS`] characters.
pub fn validate_initial_username(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    if trimmed.chars().count() > MAX_USERNAME_CHARS {
        return Err(ValidationError::UsernameTooLong {
            max: MAX_USERNAME_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

impl UsernameSetupController {
    pub fn new(api: Arc<dyn AccountApi>, tokens: Arc<dyn TokenProvider>) -> Arc<Self> {
        Arc::new(Self {
            api,
            tokens,
            inner: Mutex::new(UsernameSetupInner {
                view: UsernameSetupView::default(),
                submit: ActionSlot::default(),
            }),
        })
    }

    pub async fn snapshot(&self) -> UsernameSetupView {
        let guard = self.inner.lock().await;
        let mut view = guard.view.clone();
        view.submitting = guard.submit.is_busy();
        view
    }

    pub async fn set_username(&self, value: impl Into<String>) {
        self.inner.lock().await.view.username = value.into();
    }

    pub async fn submit(self: &Arc<Self>) -> Result<String, AccountError> {
        let inflight = {
            let mut guard = self.inner.lock().await;
            match guard.submit.inflight() {
                Some(inflight) => inflight,
                None => {
                    guard.view.error = None;
                    guard.view.success = None;
                    let prepared = match self.tokens.token() {
                        None => Err(AccountError::Unauthenticated),
                        Some(token) => validate_initial_username(&guard.view.username)
                            .map(|username| (token, username))
                            .map_err(AccountError::from),
                    };
                    let (token, username) = match prepared {
                        Ok(prepared) => prepared,
                        Err(err) => {
                            debug!("username setup: rejected locally: {err}");
                            guard.view.error = Some(err.to_string());
                            return Err(err);
                        }
                    };
                    let controller = Arc::clone(self);
                    guard
                        .submit
                        .spawn(async move { controller.run_submit(token, username).await })
                }
            }
        };
        inflight.await
    }

    async fn run_submit(&self, token: String, username: String) -> Result<String, AccountError> {
        info!(%username, "username setup: submitting");
        let request = SetUsernameRequest { username };
        let result = self.api.set_initial_username(&token, &request).await;

        let mut guard = self.inner.lock().await;
        guard.submit.finish();
        match result {
            Ok(()) => {
                guard.view.username.clear();
                guard.view.error = None;
                guard.view.success = Some(USERNAME_CREATED.to_string());
                Ok(USERNAME_CREATED.to_string())
            }
            Err(failure) => {
                let err = failure.into_account_error(ErrorDecoding::JsonThenText, SET_USERNAME_FAILED);
                warn!("username setup: failed: {err}");
                guard.view.success = None;
                guard.view.error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/username_setup_tests.rs"]
mod tests;
