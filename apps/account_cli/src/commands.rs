use std::{path::Path, sync::Arc};

use anyhow::{anyhow, Context, Result};
use client_core::{
    account_form::UNAUTHENTICATED_NOTICE, AccountApi, AccountError, AccountFormController,
    AccountFormOptions, AccountFormView, AvatarFile, FileTokenStore, InMemoryPreviewStore,
    UsernameSetupController,
};
use shared::domain::{ProfileField, SocialField, SocialLink};
use tracing::info;

/// Profile edits requested on the command line. `None` keeps the loaded value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileEdits {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub pronouns: Option<String>,
    pub company: Option<String>,
    pub telegram: Option<String>,
    pub socials: Vec<SocialLink>,
    pub clear_socials: bool,
}

impl ProfileEdits {
    fn field_values(&self) -> [(ProfileField, Option<&String>); 5] {
        [
            (ProfileField::FullName, self.full_name.as_ref()),
            (ProfileField::Bio, self.bio.as_ref()),
            (ProfileField::Pronouns, self.pronouns.as_ref()),
            (ProfileField::Company, self.company.as_ref()),
            (ProfileField::Telegram, self.telegram.as_ref()),
        ]
    }
}

const PROFILE_ROWS: [(&str, ProfileField); 5] = [
    ("Full name:", ProfileField::FullName),
    ("Bio:", ProfileField::Bio),
    ("Pronouns:", ProfileField::Pronouns),
    ("Company:", ProfileField::Company),
    ("Telegram:", ProfileField::Telegram),
];

/// Parses a `LABEL=URL` pair. Either side may be empty.
pub fn parse_social(raw: &str) -> Result<SocialLink, String> {
    let (label, url) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=URL, got '{raw}'"))?;
    Ok(SocialLink::new(label.trim(), url.trim()))
}

/// Shared wiring for every account subcommand.
pub struct Session {
    pub api: Arc<dyn AccountApi>,
    pub tokens: Arc<FileTokenStore>,
    pub options: AccountFormOptions,
}

impl Session {
    fn account_form(&self) -> Arc<AccountFormController> {
        AccountFormController::new(
            Arc::clone(&self.api),
            self.tokens.clone(),
            Arc::new(InMemoryPreviewStore::new()),
            self.options.clone(),
        )
    }

    async fn loaded_account_form(&self) -> Result<Arc<AccountFormController>> {
        let form = self.account_form();
        form.load_account().await.map_err(screen_error)?;
        Ok(form)
    }
}

/// Turns an action failure into the message the screen would show.
pub fn screen_error(err: AccountError) -> anyhow::Error {
    match err {
        AccountError::Unauthenticated => {
            anyhow!("{UNAUTHENTICATED_NOTICE} Run `account login --token <TOKEN>` first.")
        }
        other => anyhow::Error::new(other),
    }
}

/// Local validation failures exit with 2, like a usage error; everything
/// else exits with 1.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<AccountError>() {
        Some(err) if err.is_validation() => 2,
        _ => 1,
    }
}

pub fn login(tokens: &FileTokenStore, token: &str) -> Result<String> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("token must not be empty");
    }
    tokens.store(token)?;
    info!(path = %tokens.path().display(), "token stored");
    Ok("Logged in.".to_string())
}

pub fn logout(tokens: &FileTokenStore) -> Result<String> {
    tokens.clear()?;
    Ok("Logged out.".to_string())
}

pub async fn show(session: &Session) -> Result<String> {
    let form = session.loaded_account_form().await?;
    let view = form.snapshot().await;
    form.dispose().await;
    Ok(render_account(&view))
}

pub fn render_account(view: &AccountFormView) -> String {
    let mut lines = vec![
        format!("Username:  {}", view.displayed_username()),
        format!("Avatar:    {}", view.displayed_avatar()),
    ];
    for (label, field) in PROFILE_ROWS {
        lines.push(format!("{label:<11}{}", view.fields.get(field)));
    }
    let links: Vec<&SocialLink> = view
        .social_accounts
        .iter()
        .filter(|link| !link.is_blank())
        .collect();
    if links.is_empty() {
        lines.push("Social:    (none)".to_string());
    } else {
        lines.push("Social:".to_string());
        for link in links {
            lines.push(format!("  {} = {}", link.label, link.url));
        }
    }
    lines.join("\n")
}

pub async fn save(session: &Session, edits: ProfileEdits) -> Result<String> {
    let form = session.loaded_account_form().await?;

    for (field, value) in edits.field_values() {
        if let Some(value) = value {
            form.set_field(field, value.clone()).await;
        }
    }
    if edits.clear_socials {
        while form.remove_social_link(0).await.is_ok() {}
    }
    for link in edits.socials {
        form.add_social_link().await;
        let index = form.snapshot().await.social_accounts.len() - 1;
        form.edit_social_link(index, SocialField::Label, link.label)
            .await
            .map_err(screen_error)?;
        form.edit_social_link(index, SocialField::Url, link.url)
            .await
            .map_err(screen_error)?;
    }

    let result = form.save_profile().await;
    form.dispose().await;
    result.map_err(screen_error)
}

pub async fn upload_avatar(session: &Session, path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image '{}'", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "avatar".to_string());
    let mime_type = mime_guess::from_path(path).first_raw().map(str::to_string);

    let form = session.account_form();
    form.select_avatar(Some(AvatarFile::new(filename, mime_type, bytes)))
        .await;
    let result = form.upload_avatar().await;
    let view = form.snapshot().await;
    form.dispose().await;
    let message = result.map_err(screen_error)?;
    Ok(format!("{message}\nAvatar: {}", view.displayed_avatar()))
}

pub async fn change_username(session: &Session, name: &str) -> Result<String> {
    let form = session.account_form();
    form.set_new_username(name).await;
    let result = form.change_username().await;
    form.dispose().await;
    result.map_err(screen_error)
}

pub async fn set_username(session: &Session, name: &str) -> Result<String> {
    let setup = UsernameSetupController::new(Arc::clone(&session.api), session.tokens.clone());
    setup.set_username(name).await;
    setup.submit().await.map_err(screen_error)
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
