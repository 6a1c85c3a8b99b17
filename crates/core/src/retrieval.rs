//! Retrieval policy value types shared by configuration and the retriever.

use serde::{Deserialize, Serialize};

/// Vector distance used to rank documents. Lower means more similar.
///
/// Must match the metric the corpus embeddings were built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// `1 - cosine_similarity`
    #[default]
    Cosine,
    /// Euclidean distance
    L2,
}

/// How the context limit is applied to a ranked list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextPolicy {
    /// Keep ranked documents whose corpus index is below the limit.
    ///
    /// This selects a fixed leading slice of the corpus by position, emitted
    /// in rank order, regardless of how similar those documents are.
    #[default]
    ByCorpusPosition,
    /// Keep the first `limit` documents of the ranked list (true top-K).
    ByRankOrder,
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::L2 => write!(f, "l2"),
        }
    }
}

impl std::fmt::Display for ContextPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ByCorpusPosition => write!(f, "by_corpus_position"),
            Self::ByRankOrder => write!(f, "by_rank_order"),
        }
    }
}
