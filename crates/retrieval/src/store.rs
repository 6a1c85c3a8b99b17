//! Corpus file storage — a JSON array of document records.
//!
//! Record shape: `{"name": ..., "text": ..., "embedding": [...], "hash": ...}`.
//! Only `text` and `embedding` are required. Files are read whole: a corpus
//! is loaded once per session and never mutated afterwards.

use std::path::Path;

use docent_core::corpus::{Corpus, Document};
use docent_core::error::CorpusError;
use md5::Md5;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Load and validate a corpus file.
///
/// Unlike a best-effort cache, a corpus is all-or-nothing: a malformed
/// record or a dimension mismatch fails the whole load.
pub fn load_corpus(path: &Path) -> Result<Corpus, CorpusError> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let documents: Vec<Document> =
        serde_json::from_str(&content).map_err(|e| CorpusError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let corpus = Corpus::new(documents)?;
    info!(
        path = %path.display(),
        documents = corpus.len(),
        dimension = corpus.dimension(),
        "Corpus loaded"
    );
    Ok(corpus)
}

/// Write documents as a corpus file, creating parent directories as needed.
pub fn save_corpus(path: &Path, documents: &[Document]) -> Result<(), CorpusError> {
    let write_err = |reason: String| CorpusError::WriteError {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
    }

    let json = serde_json::to_string(documents).map_err(|e| write_err(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| write_err(e.to_string()))?;

    debug!(path = %path.display(), documents = documents.len(), "Corpus written");
    Ok(())
}

/// SHA-256 hex digest of a document's text.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// MD5 hex digest, as stamped by older corpus builders.
fn legacy_hash(text: &str) -> String {
    hex::encode(Md5::digest(text.as_bytes()))
}

/// Outcome of checking stored hashes against document texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashReport {
    /// Documents whose stored SHA-256 or MD5 matches their text
    pub verified: usize,
    /// Indices whose stored digest does not match
    pub mismatched: Vec<usize>,
    /// Indices carrying a digest of neither known kind
    pub unverifiable: Vec<usize>,
    /// Indices without a stored hash
    pub missing: Vec<usize>,
}

impl HashReport {
    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty()
    }
}

/// Compare every stored hash with a fresh digest of the document text.
///
/// The digest kind is picked from the stored length: 64 hex chars is
/// SHA-256, 32 is MD5.
pub fn verify_hashes(corpus: &Corpus) -> HashReport {
    let mut report = HashReport::default();
    for (index, doc) in corpus.documents().iter().enumerate() {
        let Some(stored) = doc.content_hash.as_deref() else {
            report.missing.push(index);
            continue;
        };
        let fresh = match stored.len() {
            64 if is_hex(stored) => content_hash(&doc.text),
            32 if is_hex(stored) => legacy_hash(&doc.text),
            _ => {
                report.unverifiable.push(index);
                continue;
            }
        };
        if stored.eq_ignore_ascii_case(&fresh) {
            report.verified += 1;
        } else {
            report.mismatched.push(index);
        }
    }
    report
}

fn is_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_hexdigit())
}
