//! # CLI Tests
//!
//! These tests cover document loading and the argument checks that run
//! before any request is made.

use anyhow::Result;
use assert_cmd::prelude::*;
use docstore::constants::{
    ENV_API_BASE_URL, ENV_API_KEY, ENV_API_VARIANT, ENV_STORE_ID, ENV_UPLOAD_BASE_URL,
};
use docstore::types::DocumentSource;
use docstore_cli::load_documents;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// A `docstore` command isolated from the caller's environment and `.env`.
fn docstore_cmd(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("docstore").unwrap();
    cmd.current_dir(dir)
        .env_remove(ENV_API_KEY)
        .env_remove(ENV_API_VARIANT)
        .env_remove(ENV_STORE_ID)
        .env_remove(ENV_API_BASE_URL)
        .env_remove(ENV_UPLOAD_BASE_URL);
    cmd
}

#[test]
fn test_load_documents_walks_directories_in_order() -> Result<()> {
    // Arrange
    let dir = tempdir()?;
    fs::write(dir.path().join("b.txt"), "plain text notes")?;
    fs::write(dir.path().join("a.md"), "intro\n# Getting Started\nbody")?;
    fs::write(dir.path().join("logo.png"), [0u8, 1, 2])?;
    fs::create_dir(dir.path().join("sub"))?;
    fs::write(dir.path().join("sub").join("c.markdown"), "# Nested")?;

    // Act
    let documents = load_documents(&[dir.path().to_path_buf()], "guide")?;

    // Assert
    let ids: Vec<&str> = documents.iter().map(|d| d.metadata.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(documents[0].metadata.title.as_deref(), Some("Getting Started"));
    assert_eq!(documents[1].metadata.title, None);
    assert_eq!(documents[0].metadata.source, DocumentSource::Filesystem);
    assert_eq!(documents[0].metadata.doc_type, "guide");
    assert!(documents[0].metadata.url.starts_with("file://"));
    assert!(documents.iter().all(|d| d.file_name.is_none()));

    Ok(())
}

#[test]
fn test_load_documents_missing_path() {
    let dir = tempdir().unwrap();

    let result = load_documents(&[dir.path().join("nope.md")], "markdown");

    let message = result.unwrap_err().to_string();
    assert!(message.contains("Failed to read"), "Unexpected error: {message}");
}

#[test]
fn test_upload_requires_api_key() {
    let dir = tempdir().unwrap();

    docstore_cmd(dir.path())
        .args(["upload", "notes.md", "--store-id", "s1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY is required"));
}

#[test]
fn test_clear_requires_confirmation() {
    let dir = tempdir().unwrap();

    docstore_cmd(dir.path())
        .args(["clear", "--api-key", "k", "--store-id", "s1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("without --yes"));
}

#[test]
fn test_clear_without_store_reports_missing_store() {
    let dir = tempdir().unwrap();

    docstore_cmd(dir.path())
        .args(["clear", "--yes", "--api-key", "k", "--variant", "corpora"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No store ID configured"));
}

#[test]
fn test_store_id_is_read_from_environment() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("empty")).unwrap();

    docstore_cmd(dir.path())
        .env(ENV_API_KEY, "k")
        .env(ENV_STORE_ID, "from-env")
        .args(["upload", "empty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to do"));
}

#[test]
fn test_list_files_is_rejected_on_file_search_stores() {
    let dir = tempdir().unwrap();

    docstore_cmd(dir.path())
        .args([
            "list-files",
            "--api-key",
            "k",
            "--store-id",
            "s1",
            "--variant",
            "fileSearchStores",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot list files"));
}

#[test]
fn test_upload_of_empty_directory_is_a_no_op() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("empty")).unwrap();

    docstore_cmd(dir.path())
        .args(["upload", "empty", "--api-key", "k", "--store-id", "s1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to do"));
}
