//! # Batch Uploader
//!
//! Drives one-document-at-a-time ingestion into a store. Each document is
//! uploaded, then polled until the store reports it ready. Failures are
//! recorded per document and never abort the batch.

use crate::constants::{DEFAULT_DOCUMENT_MIME_TYPE, DEFAULT_MAX_WAIT};
use crate::errors::StoreError;
use crate::pacing::{FixedInterval, Pacer};
use crate::providers::store::{FileContent, StoreClient, UploadOptions};
use crate::types::{BatchUploadResult, Document, UploadResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Uploads documents sequentially through an injected `StoreClient`.
#[derive(Clone, Debug)]
pub struct BatchUploader {
    client: Arc<dyn StoreClient>,
    store_id: Option<String>,
    pacer: Box<dyn Pacer>,
    max_wait: Duration,
}

/// A builder for creating `BatchUploader` instances.
#[derive(Default)]
pub struct BatchUploaderBuilder {
    client: Option<Arc<dyn StoreClient>>,
    store_id: Option<String>,
    pacer: Option<Box<dyn Pacer>>,
    max_wait: Option<Duration>,
}

impl BatchUploaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store client. Required.
    pub fn client(mut self, client: Arc<dyn StoreClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the store the documents go into.
    pub fn store_id(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }

    /// Sets the store if one is known; `None` leaves it unset.
    pub fn maybe_store_id(mut self, store_id: Option<String>) -> Self {
        self.store_id = store_id;
        self
    }

    /// Sets the pacing policy. Defaults to a fixed 500 ms interval.
    pub fn pacer(mut self, pacer: Box<dyn Pacer>) -> Self {
        self.pacer = Some(pacer);
        self
    }

    /// Sets how long to wait for each file to become active. Defaults to 60 s.
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Builds the `BatchUploader`.
    ///
    /// A missing store is only logged here; every upload will then fail with
    /// `MissingStoreId` and be reported in the batch result.
    pub fn build(self) -> Result<BatchUploader, StoreError> {
        let client = self
            .client
            .ok_or_else(|| StoreError::Config("A store client is required".to_string()))?;
        if self.store_id.is_none() {
            warn!("BatchUploader created without a store ID; uploads will fail.");
        }
        Ok(BatchUploader {
            client,
            store_id: self.store_id,
            pacer: self.pacer.unwrap_or_else(|| Box::new(FixedInterval::default())),
            max_wait: self.max_wait.unwrap_or(DEFAULT_MAX_WAIT),
        })
    }
}

impl BatchUploader {
    pub fn builder() -> BatchUploaderBuilder {
        BatchUploaderBuilder::new()
    }

    pub fn store_id(&self) -> Option<&str> {
        self.store_id.as_deref()
    }

    fn require_store(&self) -> Result<&str, StoreError> {
        self.store_id.as_deref().ok_or(StoreError::MissingStoreId)
    }

    /// Uploads one document and waits for the store to finish processing it.
    ///
    /// Every error is caught and returned as a failed `UploadResult`.
    pub async fn upload_document(&self, document: Document) -> UploadResult {
        let file_name = document.resolve_file_name();
        match self.try_upload(document, &file_name).await {
            Ok(file_id) => {
                info!("Uploaded '{file_name}' as {file_id}");
                UploadResult::succeeded(file_name, file_id)
            }
            Err(e) => {
                error!("Failed to upload '{file_name}': {e}");
                UploadResult::failed(file_name, e.to_string())
            }
        }
    }

    async fn try_upload(&self, document: Document, file_name: &str) -> Result<String, StoreError> {
        let store_id = self.require_store()?;
        let options = UploadOptions {
            display_name: Some(file_name.to_string()),
            mime_type: Some(DEFAULT_DOCUMENT_MIME_TYPE.to_string()),
            metadata: if self.client.capabilities().custom_metadata {
                document.metadata.to_custom_metadata()
            } else {
                Vec::new()
            },
        };

        let uploaded = self
            .client
            .upload_file(store_id, FileContent::Text(document.content), options)
            .await?;
        let file = self
            .client
            .wait_for_file_processing(store_id, uploaded.id(), self.max_wait)
            .await?;
        Ok(file.id().to_string())
    }

    /// Uploads every document in order, pausing after each attempt.
    pub async fn upload_documents(&self, documents: Vec<Document>) -> BatchUploadResult {
        self.upload_documents_with_progress(documents, |_, _, _| {})
            .await
    }

    /// Same as `upload_documents`, calling `on_progress(index, total, result)`
    /// after each document (1-based index) and before the pause.
    ///
    /// The callback cannot fail; if it panics, the panic unwinds through the batch.
    pub async fn upload_documents_with_progress<F>(
        &self,
        documents: Vec<Document>,
        mut on_progress: F,
    ) -> BatchUploadResult
    where
        F: FnMut(usize, usize, &UploadResult),
    {
        let started = Instant::now();
        let total = documents.len();
        info!("Uploading {total} documents");

        let mut results = Vec::with_capacity(total);
        for (index, document) in documents.into_iter().enumerate() {
            let result = self.upload_document(document).await;
            on_progress(index + 1, total, &result);
            results.push(result);
            self.pacer.pause().await;
        }

        let batch = BatchUploadResult::from_results(results, started.elapsed());
        info!(
            "Batch complete: {} succeeded, {} failed in {} ms",
            batch.success_count,
            batch.failure_count,
            batch.duration_ms()
        );
        batch
    }

    /// Deletes every file in the configured store and returns how many were deleted.
    ///
    /// Requires a variant that can list and delete files. A failed delete is
    /// logged and skipped; only listing failures are returned as errors.
    pub async fn clear_corpus(&self) -> Result<usize, StoreError> {
        let store_id = self.require_store()?;
        let capabilities = self.client.capabilities();
        if !capabilities.file_listing {
            return Err(StoreError::Unsupported {
                operation: "list_files",
                variant: self.client.variant(),
            });
        }
        if !capabilities.file_deletion {
            return Err(StoreError::Unsupported {
                operation: "delete_file",
                variant: self.client.variant(),
            });
        }

        let files = self.client.list_all_files(store_id).await?;
        info!("Clearing {} files from {store_id}", files.len());

        let mut deleted = 0;
        for file in &files {
            match self.client.delete_file(store_id, file.id()).await {
                Ok(()) => deleted += 1,
                Err(e) => warn!("Failed to delete {}: {e}", file.name),
            }
            self.pacer.pause().await;
        }

        info!("Deleted {deleted} of {} files from {store_id}", files.len());
        Ok(deleted)
    }
}
