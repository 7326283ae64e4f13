//! # Document and Upload Result Types
//!
//! `Document` is the local unit of content handed to the uploader. The result
//! types describe what happened to each document and to the batch as a whole.

use crate::constants::DOCUMENT_FILE_EXTENSION;
use crate::providers::store::{CustomMetadata, MetadataValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

/// Where a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    Github,
    Web,
    Filesystem,
    Manual,
}

impl DocumentSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentSource::Github => "github",
            DocumentSource::Web => "web",
            DocumentSource::Filesystem => "filesystem",
            DocumentSource::Manual => "manual",
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive fields carried with a document.
///
/// Keys beyond the named ones are kept in `extra` and forwarded as custom
/// metadata when the store supports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub source: DocumentSource,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocumentMetadata {
    pub fn new(
        source: DocumentSource,
        doc_type: impl Into<String>,
        id: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            source,
            doc_type: doc_type.into(),
            id: id.into(),
            url: url.into(),
            title: None,
            author: None,
            created_at: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    /// Flattens the metadata into the store's typed key/value list.
    ///
    /// Nested objects and nulls in `extra` have no typed representation and are skipped.
    pub fn to_custom_metadata(&self) -> Vec<CustomMetadata> {
        let mut entries = vec![
            string_entry("source", self.source.as_str()),
            string_entry("type", &self.doc_type),
            string_entry("id", &self.id),
            string_entry("url", &self.url),
        ];
        if let Some(title) = &self.title {
            entries.push(string_entry("title", title));
        }
        if let Some(author) = &self.author {
            entries.push(string_entry("author", author));
        }
        if let Some(created_at) = &self.created_at {
            entries.push(string_entry("createdAt", &created_at.to_rfc3339()));
        }
        if let Some(updated_at) = &self.updated_at {
            entries.push(string_entry("updatedAt", &updated_at.to_rfc3339()));
        }

        for (key, value) in &self.extra {
            let value = match value {
                Value::String(s) => MetadataValue::StringValue(s.clone()),
                Value::Bool(b) => MetadataValue::StringValue(b.to_string()),
                Value::Number(n) => match n.as_f64() {
                    Some(f) => MetadataValue::NumericValue(f),
                    None => continue,
                },
                Value::Array(items) => MetadataValue::StringListValue {
                    values: items
                        .iter()
                        .map(|v| match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect(),
                },
                Value::Null | Value::Object(_) => continue,
            };
            entries.push(CustomMetadata {
                key: key.clone(),
                value,
            });
        }
        entries
    }
}

fn string_entry(key: &str, value: &str) -> CustomMetadata {
    CustomMetadata {
        key: key.to_string(),
        value: MetadataValue::StringValue(value.to_string()),
    }
}

/// A unit of content to ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// The caller's file name, or `{source}-{type}-{id}-{timestamp}.md`.
    ///
    /// The timestamp (Unix milliseconds) keeps repeated uploads of the same
    /// logical document from colliding.
    pub fn resolve_file_name(&self) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => generate_file_name(&self.metadata, Utc::now()),
        }
    }
}

/// Builds `{source}-{type}-{id}-{timestamp}.md` for the given instant.
pub fn generate_file_name(metadata: &DocumentMetadata, now: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}-{}.{DOCUMENT_FILE_EXTENSION}",
        metadata.source,
        sanitize_segment(&metadata.doc_type),
        sanitize_segment(&metadata.id),
        now.timestamp_millis()
    )
}

/// Replaces characters that are unsafe in a file name with `_`.
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// The outcome of uploading one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResult {
    pub fn succeeded(file_name: String, file_id: String) -> Self {
        Self {
            success: true,
            file_name,
            file_id: Some(file_id),
            error: None,
        }
    }

    pub fn failed(file_name: String, error: String) -> Self {
        Self {
            success: false,
            file_name,
            file_id: None,
            error: Some(error),
        }
    }
}

/// The aggregate report for a batch. `results[i]` belongs to the i-th input document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUploadResult {
    pub total_documents: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<UploadResult>,
    #[serde(rename = "durationMs", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl BatchUploadResult {
    /// Builds the report from per-document results, deriving the counts.
    pub fn from_results(results: Vec<UploadResult>, duration: Duration) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        Self {
            total_documents: results.len(),
            success_count,
            failure_count: results.len() - success_count,
            results,
            duration,
        }
    }

    pub fn duration_ms(&self) -> u128 {
        self.duration.as_millis()
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_file_name_sanitizes_segments() {
        let metadata = DocumentMetadata::new(
            DocumentSource::Github,
            "pull request",
            "owner/repo#12",
            "https://github.com/owner/repo/pull/12",
        );
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();

        assert_eq!(
            generate_file_name(&metadata, now),
            "github-pull_request-owner_repo_12-1700000000123.md"
        );
    }

    #[test]
    fn test_file_name_override_wins() {
        let metadata = DocumentMetadata::new(DocumentSource::Manual, "note", "1", "about:blank");
        let doc = Document::new("hello", metadata).with_file_name("custom.md");
        assert_eq!(doc.resolve_file_name(), "custom.md");
    }

    #[test]
    fn test_metadata_round_trips_extra_keys_from_json() {
        let json = serde_json::json!({
            "source": "github",
            "type": "issue",
            "id": "42",
            "url": "https://github.com/o/r/issues/42",
            "title": "Crash on start",
            "labels": ["bug", "p1"],
            "comments": 3,
            "nested": { "ignored": true }
        });

        let metadata: DocumentMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(metadata.source, DocumentSource::Github);
        assert_eq!(metadata.extra.len(), 3);

        let entries = metadata.to_custom_metadata();
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert!(keys.contains(&"title"));
        assert!(keys.contains(&"labels"));
        assert!(keys.contains(&"comments"));
        assert!(!keys.contains(&"nested"));
    }

    #[test]
    fn test_batch_counts_derive_from_results() {
        let batch = BatchUploadResult::from_results(
            vec![
                UploadResult::succeeded("a.md".into(), "f1".into()),
                UploadResult::failed("b.md".into(), "boom".into()),
                UploadResult::succeeded("c.md".into(), "f3".into()),
            ],
            Duration::from_millis(1500),
        );

        assert_eq!(batch.total_documents, 3);
        assert_eq!(batch.success_count, 2);
        assert_eq!(batch.failure_count, 1);

        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["durationMs"], 1500);
        assert_eq!(json["results"][1]["error"], "boom");
    }
}
