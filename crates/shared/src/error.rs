use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Field name to human-readable message.
pub type FieldErrors = BTreeMap<String, String>;

/// Error body returned by the wallet API on a non-2xx response.
///
/// The API is inconsistent about its error shape: some endpoints answer
/// `{ "message": .. }`, the transfer endpoint answers `{ "error": .., "details": .. }`
/// and validation failures answer `{ "errors": { field: [messages] } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(
        default,
        deserialize_with = "field_errors",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub errors: FieldErrors,
}

impl ApiErrorBody {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// `message` first, then `error`; blank strings count as absent.
    pub fn human_message(&self) -> Option<&str> {
        [self.message.as_deref(), self.error.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|text| !text.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn field_errors<'de, D>(deserializer: D) -> Result<FieldErrors, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, OneOrMany>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(field, messages)| {
            let message = match messages {
                OneOrMany::One(message) => Some(message),
                OneOrMany::Many(messages) => messages.into_iter().next(),
            }?;
            Some((field, message))
        })
        .collect())
}
