use serde::{Deserialize, Serialize};

/// Error payload the API sends on rejected requests: `{ "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

impl ApiErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Tagged result of decoding the body of a failed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorBody {
    /// JSON object with a non-empty string `error` field.
    Json { error: String, raw: String },
    /// Any other non-blank body, kept verbatim.
    Text(String),
    Empty,
}

impl ErrorBody {
    pub fn decode(body: &str) -> Self {
        if body.trim().is_empty() {
            return Self::Empty;
        }

        let error = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| match value.get("error") {
                Some(serde_json::Value::String(error)) if !error.is_empty() => {
                    Some(error.clone())
                }
                _ => None,
            });

        match error {
            Some(error) => Self::Json {
                error,
                raw: body.to_string(),
            },
            None => Self::Text(body.to_string()),
        }
    }

    /// JSON `error` field, then raw text, then `default`.
    pub fn message_or(self, default: &str) -> String {
        match self {
            Self::Json { error, .. } => error,
            Self::Text(text) => text,
            Self::Empty => default.to_string(),
        }
    }

    /// Raw body text, then `default`. Does not look inside JSON.
    pub fn text_or(self, default: &str) -> String {
        match self {
            Self::Json { raw, .. } => raw,
            Self::Text(text) => text,
            Self::Empty => default.to_string(),
        }
    }
}
