//! # Store Client Configuration
//!
//! This module defines the settings consumed by `GeminiStoreClient` and the
//! logic for loading them from the environment (and a `.env` file, if present).

use crate::constants::*;
use crate::errors::StoreError;
use crate::providers::store::ApiVariant;
use std::env;
use std::time::Duration;
use tracing::warn;

/// Settings for a `GeminiStoreClient`.
#[derive(Debug, Clone)]
pub struct StoreClientConfig {
    /// The API key. Required.
    pub api_key: String,
    /// The REST base URL, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub api_base_url: String,
    /// The base URL for media uploads on the store-based API.
    pub upload_base_url: String,
    pub variant: ApiVariant,
    /// A pre-provisioned store (or corpus) to upload into.
    pub store_id: Option<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub max_pages: usize,
}

impl StoreClientConfig {
    /// Creates a configuration with the public endpoints and default timings.
    pub fn new(api_key: impl Into<String>, variant: ApiVariant) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            variant,
            store_id: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Points both the REST and upload endpoints at `base_url`. Used by tests
    /// that run against a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        self.upload_base_url = format!("{base_url}/upload");
        self.api_base_url = base_url;
        self
    }

    pub fn with_store_id(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the page ceiling for the `list_all_*` helpers. At least one page is always fetched.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Loads the configuration from environment variables.
    ///
    /// - `GEMINI_API_KEY` (required)
    /// - `GEMINI_API_VARIANT` (`corpora` or `fileSearchStores`, default the latter)
    /// - `FILE_SEARCH_STORE_ID` (optional; a warning is logged when absent)
    /// - `GEMINI_API_BASE_URL`, `GEMINI_UPLOAD_BASE_URL` (optional overrides)
    pub fn from_env() -> Result<Self, StoreError> {
        dotenvy::dotenv().ok();

        let api_key = non_empty_var(ENV_API_KEY).ok_or(StoreError::MissingApiKey)?;
        let variant = match non_empty_var(ENV_API_VARIANT) {
            Some(v) => v.parse()?,
            None => ApiVariant::default(),
        };

        let mut config = Self::new(api_key, variant);
        if let Some(url) = non_empty_var(ENV_API_BASE_URL) {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = non_empty_var(ENV_UPLOAD_BASE_URL) {
            config.upload_base_url = url.trim_end_matches('/').to_string();
        }
        config.store_id = non_empty_var(ENV_STORE_ID);
        if config.store_id.is_none() {
            warn!("{ENV_STORE_ID} is not set; uploads will fail until a store is provided.");
        }

        Ok(config)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
