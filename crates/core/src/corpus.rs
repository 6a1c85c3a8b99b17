//! Reference documents and the immutable corpus they form.
//!
//! A corpus is produced once by `docent corpus build` (or any external
//! builder that writes the same records) and loaded in full at session
//! start. Index position is the retrieval key, so order is preserved
//! exactly as it appears on disk.

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;

/// The record key that carries the embedding vector in a corpus file.
///
/// Builder and retriever are coupled only through this string.
pub const CORPUS_EMBEDDING_KEY: &str = "embedding";

/// A single pre-embedded reference document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Display name (artist, page title, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The text injected into prompts
    pub text: String,

    /// Embedding of `text`
    pub embedding: Vec<f32>,

    /// Hex digest of `text` at build time
    #[serde(rename = "hash", default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl Document {
    pub fn new(text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            name: None,
            text: text.into(),
            embedding,
            content_hash: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// An ordered, read-only set of documents sharing one embedding dimension.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    dimension: usize,
}

impl Corpus {
    /// Build a corpus, checking that every embedding is non-empty and that
    /// all embeddings have the same length.
    pub fn new(documents: Vec<Document>) -> Result<Self, CorpusError> {
        let mut dimension = 0;
        for (index, doc) in documents.iter().enumerate() {
            if doc.embedding.is_empty() {
                return Err(CorpusError::EmptyEmbedding { index });
            }
            if index == 0 {
                dimension = doc.embedding.len();
            } else if doc.embedding.len() != dimension {
                return Err(CorpusError::DimensionMismatch {
                    index,
                    expected: dimension,
                    found: doc.embedding.len(),
                });
            }
        }
        Ok(Self {
            documents,
            dimension,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Embedding dimension, or 0 for an empty corpus.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}
