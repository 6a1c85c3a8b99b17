//! Shared test helpers for session tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use docent_core::error::ProviderError;
use docent_core::message::Turn;
use docent_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage,
};

/// A mock provider that returns scripted embeddings and replies in sequence.
///
/// Every request is recorded. Panics if more calls are made than scripted.
pub struct ScriptedProvider {
    embeddings: Mutex<VecDeque<Result<Vec<f32>, ProviderError>>>,
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    embed_requests: Mutex<Vec<EmbeddingRequest>>,
    complete_requests: Mutex<Vec<ProviderRequest>>,
    reply_delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            embeddings: Mutex::new(VecDeque::new()),
            replies: Mutex::new(VecDeque::new()),
            embed_requests: Mutex::new(Vec::new()),
            complete_requests: Mutex::new(Vec::new()),
            reply_delay: None,
        }
    }

    /// Script one successful exchange.
    pub fn exchange(self, embedding: Vec<f32>, reply: &str) -> Self {
        self.embedding(Ok(embedding)).reply(Ok(reply.to_string()))
    }

    pub fn embedding(self, result: Result<Vec<f32>, ProviderError>) -> Self {
        self.embeddings.lock().unwrap().push_back(result);
        self
    }

    pub fn reply(self, result: Result<String, ProviderError>) -> Self {
        self.replies.lock().unwrap().push_back(result);
        self
    }

    /// Sleep this long before answering every completion.
    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = Some(delay);
        self
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_requests.lock().unwrap().len()
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.complete_requests.lock().unwrap().last().cloned()
    }

    pub fn embed_inputs(&self) -> Vec<String> {
        self.embed_requests
            .lock()
            .unwrap()
            .iter()
            .flat_map(|r| r.inputs.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.complete_requests.lock().unwrap().push(request);
        if let Some(delay) = self.reply_delay {
            tokio::time::sleep(delay).await;
        }
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedProvider: no more replies");
        next.map(|text| ProviderResponse {
            message: Turn::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock".into(),
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        let count = request.inputs.len();
        self.embed_requests.lock().unwrap().push(request);
        let mut embeddings = Vec::with_capacity(count);
        for _ in 0..count {
            let next = self
                .embeddings
                .lock()
                .unwrap()
                .pop_front()
                .expect("ScriptedProvider: no more embeddings");
            embeddings.push(next?);
        }
        Ok(EmbeddingResponse {
            embeddings,
            model: "mock-embedding".into(),
            usage: None,
        })
    }
}
