//! The retriever — ranks a shared corpus against a query embedding and
//! builds the context block for a turn.

use std::sync::Arc;

use docent_core::corpus::Corpus;
use docent_core::retrieval::{ContextPolicy, DistanceMetric};
use tracing::debug;

use crate::selection::{build_context_block, select};
use crate::vector::rank;

/// Result of retrieving context for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Retrieval {
    /// Every corpus index, nearest first.
    pub ranked: Vec<usize>,
    /// Indices that passed the context policy, in rank order.
    pub selected: Vec<usize>,
    /// Concatenated texts of `selected`.
    pub context: String,
}

/// Read-only retriever over an immutable corpus.
///
/// Cheap to share between sessions behind an `Arc`; every method takes `&self`.
#[derive(Debug, Clone)]
pub struct Retriever {
    corpus: Arc<Corpus>,
    metric: DistanceMetric,
    policy: ContextPolicy,
    context_limit: usize,
}

impl Retriever {
    pub fn new(corpus: Arc<Corpus>, context_limit: usize) -> Self {
        Self {
            corpus,
            metric: DistanceMetric::default(),
            policy: ContextPolicy::default(),
            context_limit,
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_policy(mut self, policy: ContextPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn policy(&self) -> ContextPolicy {
        self.policy
    }

    pub fn context_limit(&self) -> usize {
        self.context_limit
    }

    /// Rank the whole corpus against `query`, nearest first.
    pub fn rank(&self, query: &[f32]) -> Vec<usize> {
        rank(query, &self.corpus, self.metric)
    }

    /// Rank, apply the context policy, and build the context block.
    pub fn context_for(&self, query: &[f32]) -> Retrieval {
        let ranked = self.rank(query);
        let selected = select(&ranked, self.context_limit, self.policy);
        let context = build_context_block(&self.corpus, &selected);
        debug!(
            ranked = ranked.len(),
            selected = selected.len(),
            policy = %self.policy,
            metric = %self.metric,
            "Context selected"
        );
        Retrieval {
            ranked,
            selected,
            context,
        }
    }
}
