#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared helpers for the store client and uploader tests: tracing setup and
//! clients pointed at a local mock server.

use docstore::providers::store::{ApiVariant, GeminiStoreClient};
use docstore::StoreClientConfig;
use dotenvy::dotenv;
use std::sync::Once;
use std::time::Duration;
use wiremock::MockServer;

static INIT: Once = Once::new();

pub const TEST_API_KEY: &str = "test-api-key";

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenv().ok();
        tracing_subscriber::fmt::init();
    });
}

/// A client for `variant` that talks to `server` and polls every `poll_interval`.
pub fn client_for(
    server: &MockServer,
    variant: ApiVariant,
    poll_interval: Duration,
) -> GeminiStoreClient {
    let config = StoreClientConfig::new(TEST_API_KEY, variant)
        .with_base_url(server.uri())
        .with_store_id("s1")
        .with_poll_interval(poll_interval);
    GeminiStoreClient::new(config).expect("client should build")
}
