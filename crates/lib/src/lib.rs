//! # docstore
//!
//! This crate provides a client for Google's File Search REST API and a batch
//! uploader that ingests documents into a store one at a time, waiting for
//! each file to finish processing and reporting per-document results.
//!
//! The client targets one of two API shapes (`ApiVariant`). The legacy
//! `corpora` API can list, inspect and delete individual files; the
//! `fileSearchStores` API cannot, and the client says so through
//! `StoreCapabilities` rather than issuing calls that cannot succeed.

pub mod config;
pub mod constants;
pub mod errors;
pub mod pacing;
pub mod providers;
pub mod types;
pub mod uploader;

pub use config::StoreClientConfig;
pub use errors::StoreError;
pub use pacing::{FixedInterval, NoDelay, Pacer};
pub use providers::store::{
    ApiVariant, FileContent, FileState, GeminiStoreClient, Page, RemoteFile, RemoteStore,
    StoreCapabilities, StoreClient, UploadOptions,
};
pub use types::{
    BatchUploadResult, Document, DocumentMetadata, DocumentSource, UploadResult,
};
pub use uploader::{BatchUploader, BatchUploaderBuilder};
