use super::*;

use std::{
    env,
    path::PathBuf,
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use client_core::{ApiFailure, TokenProvider};
use shared::{
    domain::AccountProfile,
    protocol::{
        AccountUpdateRequest, AvatarUploadResponse, ChangeUsernameRequest, SetUsernameRequest,
        UsernameChangeResult,
    },
};

#[derive(Default)]
struct StubApi {
    profile: AccountProfile,
    updates: Mutex<Vec<AccountUpdateRequest>>,
    uploads: Mutex<Vec<AvatarFile>>,
}

#[async_trait]
impl AccountApi for StubApi {
    async fn fetch_account(&self, _token: &str) -> Result<AccountProfile, ApiFailure> {
        Ok(self.profile.clone())
    }

    async fn update_account(
        &self,
        _token: &str,
        request: &AccountUpdateRequest,
    ) -> Result<(), ApiFailure> {
        self.updates.lock().expect("lock").push(request.clone());
        Ok(())
    }

    async fn upload_avatar(
        &self,
        _token: &str,
        file: AvatarFile,
    ) -> Result<AvatarUploadResponse, ApiFailure> {
        self.uploads.lock().expect("lock").push(file);
        Ok(AvatarUploadResponse {
            avatar_url: Some("https://cdn.example/me.png".to_string()),
        })
    }

    async fn change_username(
        &self,
        _token: &str,
        request: &ChangeUsernameRequest,
    ) -> Result<UsernameChangeResult, ApiFailure> {
        Ok(UsernameChangeResult {
            new_username: request.new_username.clone(),
            balance: 1234567.5,
        })
    }

    async fn set_initial_username(
        &self,
        _token: &str,
        _request: &SetUsernameRequest,
    ) -> Result<(), ApiFailure> {
        Err(ApiFailure::Status {
            status: 409,
            body: r#"{"error":"username already set"}"#.to_string(),
        })
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("account_cli_{name}_{suffix}"))
}

fn session(api: Arc<StubApi>, name: &str, logged_in: bool) -> Session {
    let tokens = Arc::new(FileTokenStore::in_data_dir(&temp_dir(name)));
    if logged_in {
        tokens.store("tok").expect("store token");
    }
    Session {
        api,
        tokens,
        options: AccountFormOptions::default(),
    }
}

#[test]
fn parse_social_splits_on_first_equals() {
    assert_eq!(
        parse_social("Site=https://a.example/?q=1"),
        Ok(SocialLink::new("Site", "https://a.example/?q=1"))
    );
    assert_eq!(parse_social("=https://b.example"), Ok(SocialLink::new("", "https://b.example")));
    assert!(parse_social("no-separator").is_err());
}

#[test]
fn login_then_logout_round_trips_token_file() {
    let tokens = FileTokenStore::in_data_dir(&temp_dir("login"));

    assert!(login(&tokens, "   ").is_err());
    login(&tokens, " abc ").expect("login");
    assert_eq!(tokens.token().as_deref(), Some("abc"));

    logout(&tokens).expect("logout");
    assert_eq!(tokens.token(), None);
    if let Some(parent) = tokens.path().parent() {
        let _ = std::fs::remove_dir_all(parent);
    }
}

#[tokio::test]
async fn show_without_login_points_at_login_command() {
    let session = session(Arc::new(StubApi::default()), "show_anon", false);

    let err = show(&session).await.expect_err("not logged in");

    let message = err.to_string();
    assert!(message.contains(UNAUTHENTICATED_NOTICE), "{message}");
    assert!(message.contains("account login"), "{message}");
}

#[tokio::test]
async fn show_renders_defaults_for_missing_values() {
    let api = Arc::new(StubApi::default());
    let session = session(api, "show", true);

    let rendered = show(&session).await.expect("show");

    assert!(rendered.contains("Username:  (not set)"), "{rendered}");
    assert!(rendered.contains("Avatar:    /avatar-default.png"), "{rendered}");
    assert!(rendered.contains("Social:    (none)"), "{rendered}");
}

#[tokio::test]
async fn save_merges_edits_into_loaded_profile() {
    let api = Arc::new(StubApi {
        profile: AccountProfile {
            full_name: Some("Budi".to_string()),
            company: Some("Toko Budi".to_string()),
            social_accounts: vec![SocialLink::new("Old", "https://old.example")],
            ..AccountProfile::default()
        },
        ..StubApi::default()
    });
    let session = session(api.clone(), "save", true);
    let edits = ProfileEdits {
        bio: Some("Batik seller".to_string()),
        socials: vec![SocialLink::new("New", "https://new.example")],
        clear_socials: true,
        ..ProfileEdits::default()
    };

    let message = save(&session, edits).await.expect("save");

    assert_eq!(message, "Account updated.");
    let updates = api.updates.lock().expect("lock");
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].fields.full_name, "Budi");
    assert_eq!(updates[0].fields.company, "Toko Budi");
    assert_eq!(updates[0].fields.bio, "Batik seller");
    assert_eq!(
        updates[0].social_accounts,
        vec![SocialLink::new("New", "https://new.example")]
    );
}

#[tokio::test]
async fn upload_avatar_guesses_mime_type_from_extension() {
    let dir = temp_dir("upload");
    std::fs::create_dir_all(&dir).expect("temp dir");
    let image = dir.join("me.png");
    std::fs::write(&image, [1u8, 2, 3]).expect("write image");
    let api = Arc::new(StubApi::default());
    let session = session(api.clone(), "upload", true);

    let message = upload_avatar(&session, &image).await.expect("upload");

    assert!(message.starts_with("Profile photo updated."), "{message}");
    assert!(message.contains("https://cdn.example/me.png"), "{message}");
    let uploads = api.uploads.lock().expect("lock");
    assert_eq!(uploads[0].filename, "me.png");
    assert_eq!(uploads[0].mime_type.as_deref(), Some("image/png"));
    drop(uploads);
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn change_username_prints_formatted_balance() {
    let session = session(Arc::new(StubApi::default()), "rename", true);

    let message = change_username(&session, "alice").await.expect("rename");

    assert!(message.contains("alice"), "{message}");
    assert!(message.contains("Rp 1.234.567,5"), "{message}");
}

#[tokio::test]
async fn set_username_surfaces_server_error_field() {
    let session = session(Arc::new(StubApi::default()), "setup", true);

    let err = set_username(&session, "budi").await.expect_err("rejected");

    assert_eq!(err.to_string(), "username already set");
}

#[tokio::test]
async fn blank_rename_exits_like_a_usage_error() {
    let session = session(Arc::new(StubApi::default()), "blank_rename", true);

    let err = change_username(&session, "   ").await.expect_err("blank");

    assert_eq!(err.to_string(), "enter a new username");
    assert_eq!(exit_code_for(&err), 2);

    let rejected = set_username(&session, "budi").await.expect_err("rejected");
    assert_eq!(exit_code_for(&rejected), 1);
}

#[test]
fn render_lists_profile_fields_in_form_order() {
    let mut view = AccountFormView {
        username: "budi".to_string(),
        social_accounts: vec![SocialLink::new("Shop", "https://shop.example")],
        ..AccountFormView::default()
    };
    view.fields.set(ProfileField::FullName, "Budi Santoso");
    view.fields.set(ProfileField::Telegram, "@budi");

    let rendered = render_account(&view);

    assert_eq!(
        rendered.lines().collect::<Vec<_>>(),
        vec![
            "Username:  budi",
            "Avatar:    /avatar-default.png",
            "Full name: Budi Santoso",
            "Bio:       ",
            "Pronouns:  ",
            "Company:   ",
            "Telegram:  @budi",
            "Social:",
            "  Shop = https://shop.example",
        ]
    );
}
