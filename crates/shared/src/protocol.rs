use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{ProfileFields, SocialLink};

pub const ACCOUNT_ME_PATH: &str = "/api/account/me";
pub const ACCOUNT_PATH: &str = "/api/account";
pub const ACCOUNT_AVATAR_PATH: &str = "/api/account/avatar";
pub const CHANGE_USERNAME_PATH: &str = "/api/account/change-username";
pub const SET_USERNAME_PATH: &str = "/api/auth/username";

/// Multipart field name carrying the avatar image.
pub const AVATAR_FORM_FIELD: &str = "file";

/// Body of `PUT /api/account`: the form fields flattened next to the links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdateRequest {
    #[serde(flatten)]
    pub fields: ProfileFields,
    pub social_accounts: Vec<SocialLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarUploadResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeUsernameRequest {
    pub new_username: String,
}

/// Confirmed outcome of a paid rename. `balance` is the remaining IDR balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsernameChangeResult {
    pub new_username: String,
    /// Missing or null reads as zero; the rename itself is still confirmed.
    #[serde(default, deserialize_with = "number_or_zero")]
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetUsernameRequest {
    pub username: String,
}

fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}
