pub mod gemini;
pub mod types;

use crate::constants::{DEFAULT_MAX_PAGES, DEFAULT_POLL_INTERVAL};
use crate::errors::StoreError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde::Serialize;
use std::fmt::{self, Debug};
use std::str::FromStr;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, warn};

pub use gemini::GeminiStoreClient;
pub use types::{FileError, FileState, Page, RemoteFile, RemoteStore};

/// The two remote API shapes the client can target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ApiVariant {
    /// Legacy `corpora` API: per-file listing, inspection and deletion.
    Corpora,
    /// `fileSearchStores` API: uploads return an operation; no per-file introspection.
    #[default]
    FileSearchStores,
}

impl ApiVariant {
    /// The collection segment used in resource names and URLs.
    pub fn collection(self) -> &'static str {
        match self {
            ApiVariant::Corpora => "corpora",
            ApiVariant::FileSearchStores => "fileSearchStores",
        }
    }

    pub fn capabilities(self) -> StoreCapabilities {
        match self {
            ApiVariant::Corpora => StoreCapabilities {
                file_listing: true,
                file_inspection: true,
                file_deletion: true,
                custom_metadata: true,
            },
            ApiVariant::FileSearchStores => StoreCapabilities {
                file_listing: false,
                file_inspection: false,
                file_deletion: false,
                custom_metadata: false,
            },
        }
    }
}

impl fmt::Display for ApiVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

impl FromStr for ApiVariant {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "corpora" | "corpus" | "legacy" => Ok(ApiVariant::Corpora),
            "b" | "filesearchstores" | "file-search-stores" | "file_search_stores" | "stores" => {
                Ok(ApiVariant::FileSearchStores)
            }
            other => Err(StoreError::Config(format!("Unknown API variant: {other}"))),
        }
    }
}

/// What a store variant can do at the file level.
///
/// Callers check these flags instead of making calls that are guaranteed to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreCapabilities {
    pub file_listing: bool,
    pub file_inspection: bool,
    pub file_deletion: bool,
    pub custom_metadata: bool,
}

/// The body of an upload.
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    Text(String),
    Bytes(Vec<u8>),
}

impl FileContent {
    pub fn len(&self) -> usize {
        match self {
            FileContent::Text(s) => s.len(),
            FileContent::Bytes(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            FileContent::Text(s) => s.into_bytes(),
            FileContent::Bytes(b) => b,
        }
    }
}

impl From<String> for FileContent {
    fn from(value: String) -> Self {
        FileContent::Text(value)
    }
}

impl From<&str> for FileContent {
    fn from(value: &str) -> Self {
        FileContent::Text(value.to_string())
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(value: Vec<u8>) -> Self {
        FileContent::Bytes(value)
    }
}

/// A typed value in the service's `customMetadata` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataValue {
    StringValue(String),
    NumericValue(f64),
    StringListValue { values: Vec<String> },
}

/// One `customMetadata` entry, serialized as `{"key": .., "stringValue": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomMetadata {
    pub key: String,
    #[serde(flatten)]
    pub value: MetadataValue,
}

/// Optional attributes sent alongside an upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOptions {
    pub display_name: Option<String>,
    pub mime_type: Option<String>,
    pub metadata: Vec<CustomMetadata>,
}

/// A trait for interacting with a remote document store.
///
/// Implementations translate each operation into one authenticated request and
/// always return `Err` on failure. The paging and polling helpers are provided
/// on top of the single-call operations.
#[async_trait]
pub trait StoreClient: Send + Sync + Debug + DynClone {
    /// The API shape this client targets.
    fn variant(&self) -> ApiVariant;

    fn capabilities(&self) -> StoreCapabilities {
        self.variant().capabilities()
    }

    /// Delay between `get_file` calls in `wait_for_file_processing`.
    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Ceiling on pages fetched by `list_all_stores` and `list_all_files`.
    fn max_pages(&self) -> usize {
        DEFAULT_MAX_PAGES
    }

    async fn create_store(&self, display_name: &str) -> Result<RemoteStore, StoreError>;

    async fn get_store(&self, store_id: &str) -> Result<RemoteStore, StoreError>;

    /// Deletes a store. With `force`, documents inside it are deleted too.
    async fn delete_store(&self, store_id: &str, force: bool) -> Result<(), StoreError>;

    async fn list_stores(
        &self,
        page_token: Option<&str>,
        page_size: Option<u32>,
    ) -> Result<Page<RemoteStore>, StoreError>;

    async fn upload_file(
        &self,
        store_id: &str,
        content: FileContent,
        options: UploadOptions,
    ) -> Result<RemoteFile, StoreError>;

    async fn list_files(
        &self,
        store_id: &str,
        page_token: Option<&str>,
        page_size: Option<u32>,
    ) -> Result<Page<RemoteFile>, StoreError>;

    async fn get_file(&self, store_id: &str, file_id: &str) -> Result<RemoteFile, StoreError>;

    async fn delete_file(&self, store_id: &str, file_id: &str) -> Result<(), StoreError>;

    /// Fetches every store, following `nextPageToken` until the service omits it.
    async fn list_all_stores(&self) -> Result<Vec<RemoteStore>, StoreError> {
        let max_pages = self.max_pages().max(1);
        let mut stores = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..max_pages {
            let page = self.list_stores(page_token.as_deref(), None).await?;
            stores.extend(page.items);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => return Ok(stores),
            }
        }

        warn!("[list_all_stores] Gave up after {max_pages} pages.");
        Err(StoreError::PaginationLimit { pages: max_pages })
    }

    /// Fetches every file in a store, following `nextPageToken` until the service omits it.
    async fn list_all_files(&self, store_id: &str) -> Result<Vec<RemoteFile>, StoreError> {
        let max_pages = self.max_pages().max(1);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..max_pages {
            let page = self
                .list_files(store_id, page_token.as_deref(), None)
                .await?;
            files.extend(page.items);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => return Ok(files),
            }
        }

        warn!("[list_all_files] Gave up on '{store_id}' after {max_pages} pages.");
        Err(StoreError::PaginationLimit { pages: max_pages })
    }

    /// Polls `get_file` until the file is `ACTIVE`, `FAILED`, or `max_wait` elapses.
    ///
    /// The loop only reads the remote file. Sleeps are clamped to the remaining
    /// budget and each `get_file` must finish before `max_wait` plus one poll
    /// interval, so the call never runs past that deadline.
    ///
    /// When the variant cannot inspect files this returns a synthetic `ACTIVE`
    /// record straight away; it does not prove the service finished processing.
    async fn wait_for_file_processing(
        &self,
        store_id: &str,
        file_id: &str,
        max_wait: Duration,
    ) -> Result<RemoteFile, StoreError> {
        if !self.capabilities().file_inspection {
            debug!(
                "[wait_for_file_processing] {} cannot inspect files; assuming '{file_id}' is active.",
                self.variant()
            );
            return Ok(RemoteFile {
                name: file_id.to_string(),
                state: FileState::Active,
                ..Default::default()
            });
        }

        let interval = self.poll_interval();
        let started = Instant::now();
        let deadline = started + max_wait + interval;

        loop {
            let file = match timeout_at(deadline, self.get_file(store_id, file_id)).await {
                Ok(file) => file?,
                Err(_) => {
                    warn!("[wait_for_file_processing] get_file for '{file_id}' outlived the wait budget.");
                    return Err(StoreError::Timeout {
                        file_id: file_id.to_string(),
                        waited: started.elapsed(),
                    });
                }
            };
            match file.state {
                FileState::Active => {
                    info!(
                        "[wait_for_file_processing] '{file_id}' is active after {:?}.",
                        started.elapsed()
                    );
                    return Ok(file);
                }
                FileState::Failed => {
                    let message = file
                        .error
                        .map(|e| e.message)
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "no error detail provided by the service".to_string());
                    return Err(StoreError::ProcessingFailed(message));
                }
                state => debug!("[wait_for_file_processing] '{file_id}' is {state:?}."),
            }

            let elapsed = started.elapsed();
            if elapsed >= max_wait {
                return Err(StoreError::Timeout {
                    file_id: file_id.to_string(),
                    waited: elapsed,
                });
            }
            sleep(interval.min(max_wait.saturating_sub(elapsed))).await;
        }
    }
}

dyn_clone::clone_trait_object!(StoreClient);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parsing_and_capabilities() {
        assert_eq!("corpora".parse::<ApiVariant>().unwrap(), ApiVariant::Corpora);
        assert_eq!("B".parse::<ApiVariant>().unwrap(), ApiVariant::FileSearchStores);
        assert!("bogus".parse::<ApiVariant>().is_err());

        assert!(ApiVariant::Corpora.capabilities().file_listing);
        let stores = ApiVariant::FileSearchStores.capabilities();
        assert!(!stores.file_listing && !stores.file_inspection && !stores.file_deletion);
    }

    #[test]
    fn test_custom_metadata_wire_shape() {
        let entries = vec![
            CustomMetadata {
                key: "source".to_string(),
                value: MetadataValue::StringValue("github".to_string()),
            },
            CustomMetadata {
                key: "stars".to_string(),
                value: MetadataValue::NumericValue(12.0),
            },
            CustomMetadata {
                key: "labels".to_string(),
                value: MetadataValue::StringListValue {
                    values: vec!["bug".to_string()],
                },
            },
        ];

        let json = serde_json::to_value(&entries).unwrap();

        assert_eq!(
            json,
            serde_json::json!([
                { "key": "source", "stringValue": "github" },
                { "key": "stars", "numericValue": 12.0 },
                { "key": "labels", "stringListValue": { "values": ["bug"] } }
            ])
        );
    }
}
