//! Corpus building — embeds source records and stamps content hashes.

use std::path::Path;

use docent_core::corpus::{Corpus, Document};
use docent_core::error::{CorpusError, Error, ProviderError};
use docent_core::provider::{EmbeddingRequest, Provider};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::store::content_hash;

/// One input record: the text to index and an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub text: String,
}

/// Read a JSON array of [`SourceRecord`]s.
pub fn load_records(path: &Path) -> Result<Vec<SourceRecord>, CorpusError> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| CorpusError::ParseError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Embed `records` in batches and assemble a validated corpus.
///
/// Output order matches input order. Every document gets a SHA-256
/// content hash of its text.
pub async fn build_corpus(
    provider: &dyn Provider,
    model: &str,
    records: Vec<SourceRecord>,
    batch_size: usize,
) -> Result<Corpus, Error> {
    let batch_size = batch_size.max(1);
    let mut documents = Vec::with_capacity(records.len());

    for (batch_index, batch) in records.chunks(batch_size).enumerate() {
        let request = EmbeddingRequest {
            model: model.to_string(),
            inputs: batch.iter().map(|r| r.text.clone()).collect(),
        };
        let response = provider.embed(request).await?;

        if response.embeddings.len() != batch.len() {
            return Err(ProviderError::ApiError {
                status_code: 200,
                message: format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    response.embeddings.len()
                ),
            }
            .into());
        }

        for (record, embedding) in batch.iter().zip(response.embeddings) {
            documents.push(Document {
                name: record.name.clone(),
                text: record.text.clone(),
                embedding,
                content_hash: Some(content_hash(&record.text)),
            });
        }
        debug!(batch = batch_index, embedded = documents.len(), "Embedded batch");
    }

    let corpus = Corpus::new(documents)?;
    info!(
        documents = corpus.len(),
        dimension = corpus.dimension(),
        model,
        "Corpus built"
    );
    Ok(corpus)
}
