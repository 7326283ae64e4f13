use async_trait::async_trait;
use docstore::errors::StoreError;
use docstore::providers::store::{
    ApiVariant, FileContent, FileState, Page, RemoteFile, RemoteStore, StoreClient, UploadOptions,
};
use docstore::types::{Document, DocumentMetadata, DocumentSource};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// --- Test Fixtures ---

/// Builds a GitHub-issue document with the given id.
pub fn sample_document(id: &str) -> Document {
    let metadata = DocumentMetadata::new(
        DocumentSource::Github,
        "issue",
        id,
        format!("https://github.com/acme/widgets/issues/{id}"),
    );
    Document::new(format!("# Issue {id}\n\nSomething is broken."), metadata)
}

/// A file record in the given state.
pub fn remote_file(name: &str, state: FileState) -> RemoteFile {
    RemoteFile {
        name: name.to_string(),
        state,
        ..Default::default()
    }
}

// --- Mock Store Client ---

/// A scripted reply: either a value or an HTTP-style failure.
#[derive(Clone, Debug)]
pub enum MockReply<T> {
    Ok(T),
    Fail { status: u16, body: String },
}

impl<T> MockReply<T> {
    fn into_result(self) -> Result<T, StoreError> {
        match self {
            MockReply::Ok(value) => Ok(value),
            MockReply::Fail { status, body } => Err(StoreError::RemoteService { status, body }),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    uploads: VecDeque<MockReply<RemoteFile>>,
    file_states: VecDeque<MockReply<RemoteFile>>,
    stores: Vec<RemoteStore>,
    files: Vec<RemoteFile>,
    page_size: Option<usize>,
    failing_deletes: HashSet<String>,
    calls: Vec<String>,
    uploaded: usize,
}

/// An in-memory `StoreClient` with scripted replies and call recording.
///
/// Unscripted uploads succeed with `files/file-{n}` and unscripted polls
/// report the requested file as `ACTIVE`.
#[derive(Clone, Debug)]
pub struct MockStoreClient {
    variant: ApiVariant,
    poll_interval: Duration,
    state: Arc<Mutex<MockState>>,
}

impl MockStoreClient {
    pub fn new(variant: ApiVariant) -> Self {
        Self {
            variant,
            poll_interval: Duration::from_millis(5),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Queues the reply for the next `upload_file` call.
    pub fn push_upload(&self, reply: MockReply<RemoteFile>) {
        self.state.lock().unwrap().uploads.push_back(reply);
    }

    /// Queues the reply for the next `get_file` call.
    pub fn push_file_state(&self, reply: MockReply<RemoteFile>) {
        self.state.lock().unwrap().file_states.push_back(reply);
    }

    pub fn set_stores(&self, stores: Vec<RemoteStore>, page_size: Option<usize>) {
        let mut state = self.state.lock().unwrap();
        state.stores = stores;
        state.page_size = page_size;
    }

    pub fn set_files(&self, files: Vec<RemoteFile>, page_size: Option<usize>) {
        let mut state = self.state.lock().unwrap();
        state.files = files;
        state.page_size = page_size;
    }

    /// Makes `delete_file` fail for the given file id.
    pub fn fail_delete(&self, file_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(file_id.to_string());
    }

    /// Every recorded call, as `operation:argument`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// How many calls were made to the given operation.
    pub fn call_count(&self, operation: &str) -> usize {
        let prefix = format!("{operation}:");
        self.calls()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    fn record(&self, operation: &str, argument: &str) {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(format!("{operation}:{argument}"));
    }

    fn page_of<T: Clone>(
        items: &[T],
        page_size: Option<usize>,
        page_token: Option<&str>,
    ) -> Page<T> {
        let start: usize = page_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let size = page_size.unwrap_or(items.len().max(1));
        let end = (start + size).min(items.len());
        Page {
            items: items[start.min(end)..end].to_vec(),
            next_page_token: (end < items.len()).then(|| end.to_string()),
        }
    }
}

#[async_trait]
impl StoreClient for MockStoreClient {
    fn variant(&self) -> ApiVariant {
        self.variant
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn create_store(&self, display_name: &str) -> Result<RemoteStore, StoreError> {
        self.record("create_store", display_name);
        Ok(RemoteStore {
            name: format!("{}/mock-store", self.variant.collection()),
            display_name: Some(display_name.to_string()),
            ..Default::default()
        })
    }

    async fn get_store(&self, store_id: &str) -> Result<RemoteStore, StoreError> {
        self.record("get_store", store_id);
        let state = self.state.lock().unwrap();
        state
            .stores
            .iter()
            .find(|s| s.id() == store_id || s.name == store_id)
            .cloned()
            .ok_or_else(|| StoreError::RemoteService {
                status: 404,
                body: format!("store {store_id} not found"),
            })
    }

    async fn delete_store(&self, store_id: &str, _force: bool) -> Result<(), StoreError> {
        self.record("delete_store", store_id);
        Ok(())
    }

    async fn list_stores(
        &self,
        page_token: Option<&str>,
        _page_size: Option<u32>,
    ) -> Result<Page<RemoteStore>, StoreError> {
        self.record("list_stores", page_token.unwrap_or(""));
        let state = self.state.lock().unwrap();
        Ok(Self::page_of(&state.stores, state.page_size, page_token))
    }

    async fn upload_file(
        &self,
        store_id: &str,
        _content: FileContent,
        options: UploadOptions,
    ) -> Result<RemoteFile, StoreError> {
        self.record(
            "upload_file",
            &format!("{store_id}/{}", options.display_name.unwrap_or_default()),
        );
        let mut state = self.state.lock().unwrap();
        state.uploaded += 1;
        let fallback = remote_file(
            &format!("files/file-{}", state.uploaded),
            FileState::Processing,
        );
        state
            .uploads
            .pop_front()
            .unwrap_or(MockReply::Ok(fallback))
            .into_result()
    }

    async fn list_files(
        &self,
        store_id: &str,
        page_token: Option<&str>,
        _page_size: Option<u32>,
    ) -> Result<Page<RemoteFile>, StoreError> {
        self.record("list_files", store_id);
        if !self.capabilities().file_listing {
            return Ok(Page::empty());
        }
        let state = self.state.lock().unwrap();
        Ok(Self::page_of(&state.files, state.page_size, page_token))
    }

    async fn get_file(&self, store_id: &str, file_id: &str) -> Result<RemoteFile, StoreError> {
        if !self.capabilities().file_inspection {
            return Err(StoreError::Unsupported {
                operation: "get_file",
                variant: self.variant,
            });
        }
        self.record("get_file", &format!("{store_id}/{file_id}"));
        let mut state = self.state.lock().unwrap();
        state
            .file_states
            .pop_front()
            .unwrap_or_else(|| MockReply::Ok(remote_file(file_id, FileState::Active)))
            .into_result()
    }

    async fn delete_file(&self, store_id: &str, file_id: &str) -> Result<(), StoreError> {
        if !self.capabilities().file_deletion {
            return Err(StoreError::Unsupported {
                operation: "delete_file",
                variant: self.variant,
            });
        }
        self.record("delete_file", &format!("{store_id}/{file_id}"));
        let state = self.state.lock().unwrap();
        if state.failing_deletes.contains(file_id) {
            return Err(StoreError::RemoteService {
                status: 500,
                body: format!("could not delete {file_id}"),
            });
        }
        Ok(())
    }
}
