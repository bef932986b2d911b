//! Write-once index builder.
//!
//! Entries accumulate in memory and are serialized to the binary index format
//! in one pass. The corpus sits behind an [`Arc`]: a write works on a snapshot,
//! and mutating the builder while an async write is in flight copies the
//! corpus instead of touching the snapshot.

use crate::types::{Document, DocumentId, FuzzyConfig};
use error::WriteError;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

mod writer;

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum WriteError {
        #[error("Could not write index: {0}")]
        Io(#[from] std::io::Error),

        #[error("Index write was cancelled")]
        Cancelled,

        #[error("Could not encode document: {0}")]
        Encode(#[from] postcard::Error),
    }
}

/// Shared across every builder in the process so ids never collide.
static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

fn next_document_id() -> DocumentId {
    DocumentId::new(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub key: String,
    pub document_id: DocumentId,
    pub priority: u32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Corpus {
    pub entries: Vec<Entry>,
    pub documents: HashMap<DocumentId, Document>,
    pub metadata: BTreeMap<String, Document>,
    pub case_sensitive: bool,
}

#[derive(Debug, Clone)]
pub struct IndexBuilder {
    corpus: Arc<Corpus>,
    write_chunk_size: usize,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::with_config(&FuzzyConfig::default())
    }

    pub fn with_config(config: &FuzzyConfig) -> Self {
        let config = config.with_defaults_for_invalid();
        Self {
            corpus: Arc::new(Corpus {
                case_sensitive: config.case_sensitive,
                ..Corpus::default()
            }),
            write_chunk_size: config.write_chunk_size,
        }
    }

    pub fn case_sensitive(&self) -> bool {
        self.corpus.case_sensitive
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        if self.corpus.case_sensitive != case_sensitive {
            Arc::make_mut(&mut self.corpus).case_sensitive = case_sensitive;
        }
    }

    /// Number of inserted entries, duplicates included.
    pub fn len(&self) -> usize {
        self.corpus.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.entries.is_empty()
    }
}

/// Corpus operations.
impl IndexBuilder {
    /// Adds a key with its payload and returns the payload's id.
    ///
    /// Keys that fold to the same text collapse into one key on write; the
    /// last insert wins for document and priority.
    pub fn insert(&mut self, key: &str, document: Document, priority: u32) -> DocumentId {
        let document_id = next_document_id();
        let corpus = Arc::make_mut(&mut self.corpus);
        corpus.documents.insert(document_id, document);
        corpus.entries.push(Entry {
            key: key.to_string(),
            document_id,
            priority,
        });
        document_id
    }

    pub fn get_document(&self, document_id: DocumentId) -> Option<&Document> {
        self.corpus.documents.get(&document_id)
    }

    pub fn set_metadata(&mut self, key: &str, value: Document) {
        Arc::make_mut(&mut self.corpus)
            .metadata
            .insert(key.to_string(), value);
    }

    pub fn set_metadata_string(&mut self, key: &str, value: &str) {
        self.set_metadata(key, Document::String(value.to_string()));
    }

    pub fn set_metadata_uint32(&mut self, key: &str, value: u32) {
        self.set_metadata(key, Document::UInt32(value));
    }

    pub fn set_metadata_uint64(&mut self, key: &str, value: u64) {
        self.set_metadata(key, Document::UInt64(value));
    }

    pub fn metadata(&self, key: &str) -> Option<&Document> {
        self.corpus.metadata.get(key)
    }
}

/// Output.
impl IndexBuilder {
    /// Writes the index to `path`, replacing any existing file atomically.
    ///
    /// On error or cancellation nothing at `path` changes.
    pub fn write(&self, path: &Path, cancel: &CancellationToken) -> Result<(), WriteError> {
        writer::write_index(&self.corpus, path, self.write_chunk_size, cancel)
    }

    /// Like [`write`](Self::write), on a tokio blocking thread.
    ///
    /// The write covers the corpus as it is when this is called. The future
    /// does not borrow the builder, so it can keep being mutated meanwhile.
    /// Must be awaited inside a tokio runtime.
    pub fn write_async(
        &self,
        path: impl Into<PathBuf>,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), WriteError>> + Send + 'static {
        let corpus = Arc::clone(&self.corpus);
        let chunk_size = self.write_chunk_size;
        let path = path.into();

        async move {
            tokio::task::spawn_blocking(move || {
                writer::write_index(&corpus, &path, chunk_size, &cancel)
            })
            .await
            .map_err(|e| WriteError::Io(std::io::Error::other(e)))?
        }
    }
}
