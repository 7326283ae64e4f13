//! # Remote Store Types
//!
//! Wire representations of the resources the File Search service returns.
//! Field names follow the service's camelCase JSON.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A remote document collection (a legacy corpus or a file search store).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStore {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

impl RemoteStore {
    /// The trailing segment of `name`, e.g. `abc` for `corpora/abc`.
    pub fn id(&self) -> &str {
        last_segment(&self.name)
    }
}

/// Processing state of an uploaded file. Transitions are driven by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileState {
    #[serde(rename = "PROCESSING")]
    Processing,
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "FAILED")]
    Failed,
    // Catch-all for values this client does not know about.
    #[default]
    #[serde(rename = "STATE_UNSPECIFIED", alias = "UNSPECIFIED", other)]
    Unspecified,
}

impl FileState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FileState::Active | FileState::Failed)
    }
}

/// Error detail attached to a `FAILED` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// The store's record for one uploaded document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_size_bytes")]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
    #[serde(default)]
    pub sha256_hash: Option<String>,
    #[serde(default)]
    pub state: FileState,
    #[serde(default)]
    pub error: Option<FileError>,
}

impl RemoteFile {
    /// The file's local id: the trailing segment of its resource name.
    pub fn id(&self) -> &str {
        last_segment(&self.name)
    }
}

/// A single page of a list call.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_page_token: None,
        }
    }
}

pub(crate) fn last_segment(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// int64 fields arrive as JSON strings from Google APIs; accept numbers too.
fn deserialize_size_bytes<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s.parse().ok(),
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    })
}
