//! Defaults shared by the store client, the uploader and the CLI.

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://generativelanguage.googleapis.com/upload/v1beta";

/// Header used by the store-based API for key authentication.
pub const API_KEY_HEADER: &str = "X-Goog-Api-Key";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(60_000);
pub const DEFAULT_UPLOAD_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound on pages fetched by the `list_all_*` helpers.
pub const DEFAULT_MAX_PAGES: usize = 1000;

pub const DEFAULT_DOCUMENT_MIME_TYPE: &str = "text/markdown";
pub const DOCUMENT_FILE_EXTENSION: &str = "md";

// Environment variable names read by `StoreClientConfig::from_env`.
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_API_VARIANT: &str = "GEMINI_API_VARIANT";
pub const ENV_STORE_ID: &str = "FILE_SEARCH_STORE_ID";
pub const ENV_API_BASE_URL: &str = "GEMINI_API_BASE_URL";
pub const ENV_UPLOAD_BASE_URL: &str = "GEMINI_UPLOAD_BASE_URL";
