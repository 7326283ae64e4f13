use crate::providers::store::ApiVariant;
use std::time::Duration;
use thiserror::Error;

/// Custom error types for store operations.
///
/// The store client never swallows a failure: every non-2xx response, transport
/// problem or unsupported call is surfaced as one of these variants. The batch
/// uploader is the layer that downgrades them into per-document results.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to store API: {0}")]
    Request(reqwest::Error),
    #[error("Failed to deserialize store API response: {0}")]
    Deserialization(reqwest::Error),
    #[error("Store API returned {status}: {body}")]
    RemoteService { status: u16, body: String },
    #[error("'{operation}' is not supported by the {variant} API")]
    Unsupported {
        operation: &'static str,
        variant: ApiVariant,
    },
    #[error("File processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Timed out after {waited:?} waiting for file '{file_id}' to become active")]
    Timeout { file_id: String, waited: Duration },
    #[error("Pagination stopped after {pages} pages; the service kept returning a page token")]
    PaginationLimit { pages: usize },
    #[error("API key is missing")]
    MissingApiKey,
    #[error("No store ID configured")]
    MissingStoreId,
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// The HTTP status of a remote failure, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::RemoteService { status, .. } => Some(*status),
            StoreError::Request(e) | StoreError::Deserialization(e) => {
                e.status().map(|s| s.as_u16())
            }
            _ => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, StoreError::Unsupported { .. })
    }
}
