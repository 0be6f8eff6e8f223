use serde::{Deserialize, Deserializer, Serialize};

/// Account record as returned by `GET /api/account/me`.
///
/// Every field is optional on the wire; the form layer defaults missing values
/// to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub pronouns: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub social_accounts: Vec<SocialLink>,
}

/// A label/url pair shown on the public profile. Order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub label: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub url: String,
}

impl SocialLink {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }

    /// Rows with neither a label nor a url are editing placeholders.
    pub fn is_blank(&self) -> bool {
        self.label.is_empty() && self.url.is_empty()
    }

    pub fn set(&mut self, field: SocialField, value: impl Into<String>) {
        match field {
            SocialField::Label => self.label = value.into(),
            SocialField::Url => self.url = value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialField {
    Label,
    Url,
}

/// The editable text fields of the profile form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub full_name: String,
    pub bio: String,
    pub pronouns: String,
    pub company: String,
    pub telegram: String,
}

impl ProfileFields {
    pub fn from_profile(profile: &AccountProfile) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            full_name: text(&profile.full_name),
            bio: text(&profile.bio),
            pronouns: text(&profile.pronouns),
            company: text(&profile.company),
            telegram: text(&profile.telegram),
        }
    }

    pub fn get(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::FullName => &self.full_name,
            ProfileField::Bio => &self.bio,
            ProfileField::Pronouns => &self.pronouns,
            ProfileField::Company => &self.company,
            ProfileField::Telegram => &self.telegram,
        }
    }

    pub fn set(&mut self, field: ProfileField, value: impl Into<String>) {
        let slot = match field {
            ProfileField::FullName => &mut self.full_name,
            ProfileField::Bio => &mut self.bio,
            ProfileField::Pronouns => &mut self.pronouns,
            ProfileField::Company => &mut self.company,
            ProfileField::Telegram => &mut self.telegram,
        };
        *slot = value.into();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    FullName,
    Bio,
    Pronouns,
    Company,
    Telegram,
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// Anything other than an array (null, object, string) reads as no links.
fn list_or_empty<'de, D>(deserializer: D) -> Result<Vec<SocialLink>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(_) => {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}
