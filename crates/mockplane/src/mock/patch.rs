//! Typed partial updates for mocks.
//!
//! Only the fields declared on [`MockPatch`] can be patched. Unknown keys are
//! dropped by serde, and values of the wrong JSON type are ignored rather than
//! rejected. Port-bearing protocol fields are deliberately absent: changing a
//! port goes through a full update so it is re-arbitrated.

use super::types::Mock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Partial update. `None` means "not present". For nullable fields,
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockPatch {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient_nullable")]
    pub parent_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub sort_key: Option<i64>,
}

impl MockPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.enabled.is_none()
            && self.parent_id.is_none()
            && self.sort_key.is_none()
    }

    /// Apply present fields to `mock`. Returns whether anything was applied.
    pub fn apply_to(&self, mock: &mut Mock) -> bool {
        if let Some(name) = &self.name {
            mock.name = name.clone();
        }
        if let Some(description) = &self.description {
            mock.description = description.clone();
        }
        if let Some(enabled) = self.enabled {
            mock.enabled = Some(enabled);
        }
        if let Some(parent_id) = &self.parent_id {
            mock.parent_id = parent_id.clone().filter(|p| !p.is_empty());
        }
        if let Some(sort_key) = self.sort_key {
            mock.sort_key = Some(sort_key);
        }
        !self.is_empty()
    }
}

/// Present with a usable value -> `Some`, anything else -> `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Like [`lenient`], but an explicit `null` is kept as a request to clear.
fn lenient_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(Some(None));
    }
    Ok(serde_json::from_value(value).ok().map(Some))
}
