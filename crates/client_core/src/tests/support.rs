//! Scripted [`AccountApi`] and preview store for controller tests.

use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::AccountProfile,
    protocol::{
        AccountUpdateRequest, AvatarUploadResponse, ChangeUsernameRequest, SetUsernameRequest,
        UsernameChangeResult,
    },
};
use tokio::sync::Notify;

use crate::{
    error::ApiFailure,
    preview::{AvatarFile, PreviewRef, PreviewStore},
    AccountApi,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    FetchAccount { token: String },
    UpdateAccount { token: String, request: AccountUpdateRequest },
    UploadAvatar { token: String, filename: String },
    ChangeUsername { token: String, request: ChangeUsernameRequest },
    SetInitialUsername { token: String, request: SetUsernameRequest },
}

pub struct FakeAccountApi {
    pub profile: StdMutex<Result<AccountProfile, ApiFailure>>,
    pub update: StdMutex<Result<(), ApiFailure>>,
    pub upload: StdMutex<Result<AvatarUploadResponse, ApiFailure>>,
    pub change: StdMutex<Result<UsernameChangeResult, ApiFailure>>,
    pub set_username: StdMutex<Result<(), ApiFailure>>,
    calls: StdMutex<Vec<ApiCall>>,
    gate: Option<Arc<Notify>>,
}

impl FakeAccountApi {
    pub fn new() -> Self {
        Self {
            profile: StdMutex::new(Ok(AccountProfile::default())),
            update: StdMutex::new(Ok(())),
            upload: StdMutex::new(Ok(AvatarUploadResponse::default())),
            change: StdMutex::new(Ok(UsernameChangeResult {
                new_username: "renamed".to_string(),
                balance: 0.0,
            })),
            set_username: StdMutex::new(Ok(())),
            calls: StdMutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Every call waits for [`Self::release`] before answering.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn with_profile(self, profile: AccountProfile) -> Self {
        *self.profile.lock().expect("lock") = Ok(profile);
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("lock").len()
    }

    async fn record(&self, call: ApiCall) {
        self.calls.lock().expect("lock").push(call);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl AccountApi for FakeAccountApi {
    async fn fetch_account(&self, token: &str) -> Result<AccountProfile, ApiFailure> {
        self.record(ApiCall::FetchAccount {
            token: token.to_string(),
        })
        .await;
        self.profile.lock().expect("lock").clone()
    }

    async fn update_account(
        &self,
        token: &str,
        request: &AccountUpdateRequest,
    ) -> Result<(), ApiFailure> {
        self.record(ApiCall::UpdateAccount {
            token: token.to_string(),
            request: request.clone(),
        })
        .await;
        self.update.lock().expect("lock").clone()
    }

    async fn upload_avatar(
        &self,
        token: &str,
        file: AvatarFile,
    ) -> Result<AvatarUploadResponse, ApiFailure> {
        self.record(ApiCall::UploadAvatar {
            token: token.to_string(),
            filename: file.filename,
        })
        .await;
        self.upload.lock().expect("lock").clone()
    }

    async fn change_username(
        &self,
        token: &str,
        request: &ChangeUsernameRequest,
    ) -> Result<UsernameChangeResult, ApiFailure> {
        self.record(ApiCall::ChangeUsername {
            token: token.to_string(),
            request: request.clone(),
        })
        .await;
        self.change.lock().expect("lock").clone()
    }

    async fn set_initial_username(
        &self,
        token: &str,
        request: &SetUsernameRequest,
    ) -> Result<(), ApiFailure> {
        self.record(ApiCall::SetInitialUsername {
            token: token.to_string(),
            request: request.clone(),
        })
        .await;
        self.set_username.lock().expect("lock").clone()
    }
}

/// Preview store that logs every create/release in order.
#[derive(Default)]
pub struct RecordingPreviewStore {
    events: StdMutex<Vec<String>>,
    next_id: StdMutex<u32>,
}

impl RecordingPreviewStore {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("lock").clone()
    }
}

impl PreviewStore for RecordingPreviewStore {
    fn create(&self, _file: &AvatarFile) -> PreviewRef {
        let mut next_id = self.next_id.lock().expect("lock");
        *next_id += 1;
        let preview = PreviewRef::new(format!("preview-{}", *next_id));
        self.events
            .lock()
            .expect("lock")
            .push(format!("create:{preview}"));
        preview
    }

    fn release(&self, preview: &PreviewRef) {
        self.events
            .lock()
            .expect("lock")
            .push(format!("release:{preview}"));
    }
}

pub fn avatar_file(name: &str, size: usize) -> AvatarFile {
    AvatarFile::new(name, Some("image/png".to_string()), vec![7u8; size])
}

pub async fn wait_for_calls(api: &FakeAccountApi, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while api.call_count() < expected {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("api call was not issued in time");
}
