use super::types::{last_segment, FileError, FileState, Page, RemoteFile, RemoteStore};
use super::{ApiVariant, FileContent, StoreClient, UploadOptions};
use crate::config::StoreClientConfig;
use crate::constants::{API_KEY_HEADER, DEFAULT_DOCUMENT_MIME_TYPE};
use crate::errors::StoreError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

// --- File Search-specific request and response structures ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateStoreRequest<'a> {
    display_name: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ListStoresResponse {
    #[serde(default, alias = "corpora", alias = "fileSearchStores")]
    stores: Vec<RemoteStore>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ListFilesResponse {
    #[serde(default)]
    files: Vec<RemoteFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// The corpora upload response, with the file either wrapped in `{"file": ..}` or bare.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum UploadFileResponse {
    Wrapped { file: RemoteFile },
    Bare(RemoteFile),
}

impl From<UploadFileResponse> for RemoteFile {
    fn from(value: UploadFileResponse) -> Self {
        match value {
            UploadFileResponse::Wrapped { file } | UploadFileResponse::Bare(file) => file,
        }
    }
}

/// Long-running operation returned by `uploadToFileSearchStore`.
#[derive(Deserialize, Debug)]
struct UploadOperation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    response: Option<UploadOperationResponse>,
    #[serde(default)]
    error: Option<FileError>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UploadOperationResponse {
    #[serde(default)]
    document_name: Option<String>,
}

// --- File Search Store Client implementation ---

/// A client for Google's File Search REST API, in either of its two shapes.
#[derive(Clone, Debug)]
pub struct GeminiStoreClient {
    client: ReqwestClient,
    config: StoreClientConfig,
}

impl GeminiStoreClient {
    /// Creates a new `GeminiStoreClient`.
    ///
    /// A missing API key is an error. A missing default store is only a
    /// warning: calls that need a store will fail when they are made.
    pub fn new(config: StoreClientConfig) -> Result<Self, StoreError> {
        if config.api_key.trim().is_empty() {
            return Err(StoreError::MissingApiKey);
        }
        if config.store_id.is_none() {
            warn!("No store ID configured; provide one per call or uploads will fail.");
        }
        let client = ReqwestClient::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(StoreError::ReqwestClientBuild)?;
        info!(
            "Created File Search client for the {} API at {}",
            config.variant, config.api_base_url
        );
        Ok(Self { client, config })
    }

    /// Creates a client from `StoreClientConfig::from_env`.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::new(StoreClientConfig::from_env()?)
    }

    /// The store configured at construction time, if any.
    pub fn default_store_id(&self) -> Option<&str> {
        self.config.store_id.as_deref()
    }

    /// Accepts `abc` or `corpora/abc` and returns the full resource name.
    ///
    /// An id qualified with the other variant's collection is re-qualified for
    /// this one, with a warning.
    fn store_name(&self, store_id: &str) -> String {
        let collection = self.config.variant.collection();
        if let Some(rest) = store_id.strip_prefix(collection) {
            if rest.starts_with('/') {
                return store_id.to_string();
            }
        }
        let foreign = match self.config.variant {
            ApiVariant::Corpora => ApiVariant::FileSearchStores,
            ApiVariant::FileSearchStores => ApiVariant::Corpora,
        };
        if let Some(bare) = store_id
            .strip_prefix(foreign.collection())
            .and_then(|rest| rest.strip_prefix('/'))
        {
            warn!("Store '{store_id}' belongs to the {foreign} API; using '{collection}/{bare}'.");
            return format!("{collection}/{bare}");
        }
        format!("{collection}/{store_id}")
    }

    fn file_path(&self, store_id: &str, file_id: &str) -> String {
        format!(
            "{}/files/{}",
            self.store_name(store_id),
            last_segment(file_id)
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.variant {
            ApiVariant::Corpora => request.query(&[("key", &self.config.api_key)]),
            ApiVariant::FileSearchStores => request.header(API_KEY_HEADER, &self.config.api_key),
        }
    }

    fn unsupported(&self, operation: &'static str) -> StoreError {
        StoreError::Unsupported {
            operation,
            variant: self.config.variant,
        }
    }

    /// Sends the request and turns any non-2xx response into `RemoteService`.
    ///
    /// Error bodies are kept as raw text; the service does not always send JSON.
    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(StoreError::Request)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            debug!("<-- Store API error {status}: {body}");
            return Err(StoreError::RemoteService { status, body });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(StoreError::Deserialization)
    }

    fn page_query(page_token: Option<&str>, page_size: Option<u32>) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }
        if let Some(size) = page_size {
            query.push(("pageSize", size.to_string()));
        }
        query
    }

    fn upload_form(
        &self,
        metadata: serde_json::Value,
        bytes: Vec<u8>,
        display_name: Option<String>,
        mime_type: &str,
    ) -> Result<Form, StoreError> {
        let metadata_part = Part::text(metadata.to_string())
            .mime_str("application/json")
            .map_err(|e| StoreError::Config(format!("Invalid metadata part: {e}")))?;
        let mut file_part = Part::bytes(bytes)
            .mime_str(mime_type)
            .map_err(|e| StoreError::Config(format!("Invalid MIME type '{mime_type}': {e}")))?;
        if let Some(name) = display_name {
            file_part = file_part.file_name(name);
        }
        Ok(Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part))
    }
}

#[async_trait]
impl StoreClient for GeminiStoreClient {
    fn variant(&self) -> ApiVariant {
        self.config.variant
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    fn max_pages(&self) -> usize {
        self.config.max_pages
    }

    async fn create_store(&self, display_name: &str) -> Result<RemoteStore, StoreError> {
        let url = self.url(self.config.variant.collection());
        info!("Creating store '{display_name}'");
        let request = self
            .client
            .post(&url)
            .json(&CreateStoreRequest { display_name });
        let store: RemoteStore = self.send_json(request).await?;
        info!("Created store: {}", store.name);
        Ok(store)
    }

    async fn get_store(&self, store_id: &str) -> Result<RemoteStore, StoreError> {
        let url = self.url(&self.store_name(store_id));
        self.send_json(self.client.get(&url)).await
    }

    async fn delete_store(&self, store_id: &str, force: bool) -> Result<(), StoreError> {
        let url = self.url(&self.store_name(store_id));
        info!("Deleting store '{store_id}' (force: {force})");
        let request = self
            .client
            .delete(&url)
            .query(&[("force", force.to_string())]);
        self.send(request).await?;
        Ok(())
    }

    async fn list_stores(
        &self,
        page_token: Option<&str>,
        page_size: Option<u32>,
    ) -> Result<Page<RemoteStore>, StoreError> {
        let url = self.url(self.config.variant.collection());
        let request = self
            .client
            .get(&url)
            .query(&Self::page_query(page_token, page_size));
        let response: ListStoresResponse = self.send_json(request).await?;
        Ok(Page {
            items: response.stores,
            next_page_token: response.next_page_token,
        })
    }

    async fn upload_file(
        &self,
        store_id: &str,
        content: FileContent,
        options: UploadOptions,
    ) -> Result<RemoteFile, StoreError> {
        let store_name = self.store_name(store_id);
        let mime_type = options
            .mime_type
            .clone()
            .unwrap_or_else(|| DEFAULT_DOCUMENT_MIME_TYPE.to_string());
        let size = content.len() as u64;
        info!(
            "Uploading {:?} ({size} bytes) to {store_name}",
            options.display_name.as_deref().unwrap_or("unnamed")
        );

        match self.config.variant {
            ApiVariant::Corpora => {
                let metadata = json!({
                    "file": {
                        "displayName": options.display_name,
                        "customMetadata": options.metadata,
                    }
                });
                let form = self.upload_form(
                    metadata,
                    content.into_bytes(),
                    options.display_name,
                    &mime_type,
                )?;
                let url = self.url(&format!("{store_name}/files"));
                let response: UploadFileResponse =
                    self.send_json(self.client.post(&url).multipart(form)).await?;
                Ok(response.into())
            }
            ApiVariant::FileSearchStores => {
                if !options.metadata.is_empty() {
                    debug!(
                        "Dropping {} custom metadata entries; not supported by {}",
                        options.metadata.len(),
                        self.config.variant
                    );
                }
                let metadata = json!({
                    "displayName": options.display_name,
                    "mimeType": mime_type,
                });
                let form = self.upload_form(
                    metadata,
                    content.into_bytes(),
                    options.display_name.clone(),
                    &mime_type,
                )?;
                let url = format!(
                    "{}/{store_name}:uploadToFileSearchStore",
                    self.config.upload_base_url
                );
                let operation: UploadOperation =
                    self.send_json(self.client.post(&url).multipart(form)).await?;

                if let Some(error) = operation.error {
                    return Err(StoreError::ProcessingFailed(error.message));
                }
                let name = operation
                    .response
                    .and_then(|r| r.document_name)
                    .unwrap_or(operation.name);
                Ok(RemoteFile {
                    name,
                    display_name: options.display_name,
                    mime_type: Some(mime_type),
                    size_bytes: Some(size),
                    state: if operation.done {
                        FileState::Active
                    } else {
                        FileState::Processing
                    },
                    ..Default::default()
                })
            }
        }
    }

    async fn list_files(
        &self,
        store_id: &str,
        page_token: Option<&str>,
        page_size: Option<u32>,
    ) -> Result<Page<RemoteFile>, StoreError> {
        if !self.capabilities().file_listing {
            debug!(
                "File listing is not available on {}; returning no files.",
                self.config.variant
            );
            return Ok(Page::empty());
        }
        let url = self.url(&format!("{}/files", self.store_name(store_id)));
        let request = self
            .client
            .get(&url)
            .query(&Self::page_query(page_token, page_size));
        let response: ListFilesResponse = self.send_json(request).await?;
        Ok(Page {
            items: response.files,
            next_page_token: response.next_page_token,
        })
    }

    async fn get_file(&self, store_id: &str, file_id: &str) -> Result<RemoteFile, StoreError> {
        if !self.capabilities().file_inspection {
            return Err(self.unsupported("get_file"));
        }
        let url = self.url(&self.file_path(store_id, file_id));
        self.send_json(self.client.get(&url)).await
    }

    async fn delete_file(&self, store_id: &str, file_id: &str) -> Result<(), StoreError> {
        if !self.capabilities().file_deletion {
            return Err(self.unsupported("delete_file"));
        }
        let url = self.url(&self.file_path(store_id, file_id));
        self.send(self.client.delete(&url)).await?;
        debug!("Deleted file {file_id} from {store_id}");
        Ok(())
    }
}
