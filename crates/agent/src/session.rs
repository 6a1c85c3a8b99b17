//! The chat session — one grounded exchange per user line.
//!
//! ```text
//! AwaitingInput ──line──▶ Retrieving ──▶ Responding ──▶ AwaitingInput
//!       │                     │               │
//!       └──"exit"──▶ Closed   └──── error ────┴──▶ AwaitingInput (rolled back)
//! ```
//!
//! Each exchange embeds the query, selects context from the corpus, sends
//! a composite user turn, and afterwards swaps the composite for the bare
//! query so retrieved text never accumulates in the transcript.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use docent_config::{AppConfig, BudgetStrictness};
use docent_core::channel::{InputSource, OutputSink};
use docent_core::error::{ChannelError, ProviderError};
use docent_core::message::{Transcript, Turn};
use docent_core::provider::{EmbeddingRequest, Provider, ProviderRequest};
use docent_retrieval::{Retrieval, Retriever};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::context::{BudgetOutcome, TokenCounter, enforce_budget_keeping_latest};
use crate::prompt::compose_prompt;

/// Input that ends the session (compared trimmed, case-insensitively).
pub const EXIT_COMMAND: &str = "exit";

/// Per-session settings, resolved once from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub max_tokens: usize,
    pub strictness: BudgetStrictness,
    pub system_prompt: String,
    pub instructions: String,
    /// Bound on each embedding or completion call
    pub request_timeout: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            chat_model: config.chat_model.clone(),
            embedding_model: config.retrieval.embedding_model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            max_tokens: config.budget.max_tokens,
            strictness: config.budget.strictness,
            system_prompt: config.persona.system_prompt.clone(),
            instructions: config.persona.instructions.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Where the session is in its turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Retrieving,
    Responding,
    Closed,
}

/// Result of handling one line of input.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// A completed exchange.
    Reply {
        text: String,
        budget: BudgetOutcome,
        retrieval: Retrieval,
    },
    /// Blank input; nothing happened.
    Ignored,
    /// The exit command was received.
    Closed,
}

/// Why a turn was aborted. The transcript is unchanged when one is returned.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Embedding request failed: {0}")]
    Embedding(#[source] ProviderError),

    #[error("Completion request failed: {0}")]
    Completion(#[source] ProviderError),

    #[error("Embedding service returned no vector for the query")]
    MissingEmbedding,

    #[error("Query embedding has {found} dimensions but the corpus has {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Session is closed")]
    Closed,
}

impl TurnError {
    /// Whether the same input may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Embedding(e) | Self::Completion(e) => e.is_retryable(),
            Self::MissingEmbedding | Self::DimensionMismatch { .. } | Self::Closed => false,
        }
    }
}

/// A single-user conversation grounded in a shared corpus.
pub struct ChatSession {
    transcript: Transcript,
    retriever: Arc<Retriever>,
    provider: Arc<dyn Provider>,
    counter: Box<dyn TokenCounter>,
    settings: SessionSettings,
    state: SessionState,
}

impl ChatSession {
    pub fn new(
        settings: SessionSettings,
        retriever: Arc<Retriever>,
        provider: Arc<dyn Provider>,
        counter: Box<dyn TokenCounter>,
    ) -> Self {
        let transcript = Transcript::new(settings.system_prompt.clone());
        info!(
            session = %transcript.id,
            provider = provider.name(),
            model = %settings.chat_model,
            documents = retriever.corpus().len(),
            "Session opened"
        );
        Self {
            transcript,
            retriever,
            provider,
            counter,
            settings,
            state: SessionState::AwaitingInput,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Handle one line of user input.
    ///
    /// On error the transcript is restored to what it was before the call
    /// and the session is ready for the next line.
    pub async fn handle_input(&mut self, input: &str) -> Result<TurnOutcome, TurnError> {
        if self.is_closed() {
            return Err(TurnError::Closed);
        }

        let query = input.trim_end_matches(['\r', '\n']);
        let command = query.trim();
        if command.eq_ignore_ascii_case(EXIT_COMMAND) {
            self.state = SessionState::Closed;
            info!(session = %self.transcript.id, turns = self.transcript.len(), "Session closed");
            return Ok(TurnOutcome::Closed);
        }
        if command.is_empty() {
            return Ok(TurnOutcome::Ignored);
        }

        let snapshot = self.transcript.clone();
        let result = self.exchange(query).await;
        self.state = SessionState::AwaitingInput;

        if let Err(e) = &result {
            warn!(session = %self.transcript.id, error = %e, "Turn aborted, transcript restored");
            self.transcript = snapshot;
        }
        result
    }

    async fn exchange(&mut self, query: &str) -> Result<TurnOutcome, TurnError> {
        self.state = SessionState::Retrieving;
        let embedding = self.embed_query(query).await?;

        let expected = self.retriever.corpus().dimension();
        if expected != 0 && embedding.len() != expected {
            return Err(TurnError::DimensionMismatch {
                expected,
                found: embedding.len(),
            });
        }

        let retrieval = self.retriever.context_for(&embedding);
        let composite = compose_prompt(&self.settings.instructions, query, &retrieval.context);
        self.transcript.append(Turn::user(composite));

        let budget = enforce_budget_keeping_latest(
            &mut self.transcript,
            self.settings.max_tokens,
            &*self.counter,
            self.settings.strictness,
        );

        self.state = SessionState::Responding;
        let request = ProviderRequest {
            model: self.settings.chat_model.clone(),
            messages: self.transcript.turns().to_vec(),
            temperature: self.settings.temperature,
            max_tokens: Some(self.settings.max_output_tokens),
        };
        let response = with_timeout(
            self.settings.request_timeout,
            "completion",
            self.provider.complete(request),
        )
        .await
        .map_err(TurnError::Completion)?;

        let text = response.message.content;
        self.transcript.append(Turn::assistant(text.clone()));
        let replaced = self.transcript.replace_last_user(query);
        debug_assert!(replaced, "composite turn survives budget enforcement");

        debug!(
            session = %self.transcript.id,
            turns = self.transcript.len(),
            tokens = budget.tokens,
            evicted = budget.evicted,
            selected = ?retrieval.selected,
            "Turn complete"
        );

        Ok(TurnOutcome::Reply {
            text,
            budget,
            retrieval,
        })
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, TurnError> {
        let request = EmbeddingRequest {
            model: self.settings.embedding_model.clone(),
            inputs: vec![query.to_string()],
        };
        let response = with_timeout(
            self.settings.request_timeout,
            "embedding",
            self.provider.embed(request),
        )
        .await
        .map_err(TurnError::Embedding)?;

        response
            .embeddings
            .into_iter()
            .next()
            .filter(|e| !e.is_empty())
            .ok_or(TurnError::MissingEmbedding)
    }

    /// Drive the session from `input` until the exit command or end of input.
    ///
    /// Turn errors are reported on `output` as one line and the loop
    /// continues; only a broken channel ends it early.
    pub async fn run(
        &mut self,
        input: &mut dyn InputSource,
        output: &mut dyn OutputSink,
    ) -> Result<(), ChannelError> {
        while !self.is_closed() {
            let Some(line) = input.next_line().await? else {
                debug!("End of input");
                self.state = SessionState::Closed;
                break;
            };

            match self.handle_input(&line).await {
                Ok(TurnOutcome::Reply { text, budget, .. }) => {
                    if !budget.fits {
                        output
                            .notice(&format!(
                                "Warning: this turn needs {} tokens, over the budget of {}",
                                budget.tokens, self.settings.max_tokens
                            ))
                            .await?;
                    }
                    output.reply(&text).await?;
                }
                Ok(TurnOutcome::Ignored) => {}
                Ok(TurnOutcome::Closed) => break,
                Err(e) => output.notice(&format!("Error: {e}")).await?,
            }
        }
        Ok(())
    }
}

async fn with_timeout<T>(
    limit: Duration,
    what: &str,
    call: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(format!(
            "{what} call exceeded {}s",
            limit.as_secs()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedProvider;
    use docent_core::channel::BufferedOutput;
    use docent_core::corpus::{Corpus, Document};
    use docent_core::message::Role;
    use std::collections::VecDeque;

    /// Five documents on distinct axes; document i points along axis i.
    fn axis_retriever(limit: usize) -> Arc<Retriever> {
        let docs = (0..5)
            .map(|i| {
                let mut e = vec![0.0; 5];
                e[i] = 1.0;
                Document::new(format!("<doc{i}>"), e)
            })
            .collect();
        Arc::new(Retriever::new(Arc::new(Corpus::new(docs).unwrap()), limit))
    }

    fn settings() -> SessionSettings {
        SessionSettings {
            instructions: "Be brief.".into(),
            request_timeout: Duration::from_secs(5),
            ..SessionSettings::default()
        }
    }

    fn session_with(provider: Arc<ScriptedProvider>, settings: SessionSettings) -> ChatSession {
        let counter = |turns: &[Turn]| turns.iter().map(|t| t.content.len()).sum::<usize>();
        ChatSession::new(settings, axis_retriever(3), provider, Box::new(counter))
    }

    fn near(axis: usize) -> Vec<f32> {
        let mut e = vec![0.1; 5];
        e[axis] = 1.0;
        e
    }

    #[tokio::test]
    async fn exit_closes_without_calls() {
        for input in ["exit", "  EXIT  ", "Exit\n"] {
            let provider = Arc::new(ScriptedProvider::new());
            let mut session = session_with(provider.clone(), settings());

            let outcome = session.handle_input(input).await.unwrap();
            assert!(matches!(outcome, TurnOutcome::Closed));
            assert_eq!(session.state(), SessionState::Closed);
            assert_eq!(session.transcript().len(), 1);
            assert_eq!(provider.embed_calls() + provider.complete_calls(), 0);
        }
    }

    #[tokio::test]
    async fn exit_must_be_whole_input() {
        let provider = Arc::new(ScriptedProvider::new().exchange(near(0), "Goodbye is a fine word."));
        let mut session = session_with(provider.clone(), settings());
        let outcome = session.handle_input("exit strategy?").await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Reply { .. }));
        assert_eq!(provider.complete_calls(), 1);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut session = session_with(provider.clone(), settings());
        assert!(matches!(session.handle_input("   ").await.unwrap(), TurnOutcome::Ignored));
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert_eq!(provider.embed_calls(), 0);
    }

    #[tokio::test]
    async fn composite_is_sent_then_replaced_by_query() {
        let provider = Arc::new(ScriptedProvider::new().exchange(near(1), "Try the blue period."));
        let mut session = session_with(provider.clone(), settings());

        let outcome = session.handle_input("Who painted blue?").await.unwrap();
        let TurnOutcome::Reply { text, .. } = outcome else {
            panic!("expected a reply");
        };
        assert_eq!(text, "Try the blue period.");
        assert_eq!(provider.embed_inputs(), vec!["Who painted blue?".to_string()]);

        let sent = provider.last_request().unwrap();
        assert_eq!(sent.messages.len(), 2);
        assert_eq!(sent.messages[0].role, Role::System);
        assert!(sent.messages[1].content.starts_with("Be brief. QUERY: Who painted blue?\n\nCONTEXT:"));
        assert!(sent.messages[1].content.contains("<doc1>"));
        assert_eq!(sent.max_tokens, Some(256));

        let turns = session.transcript().turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1], Turn::user("Who painted blue?"));
        assert_eq!(turns[2], Turn::assistant("Try the blue period."));
        assert_eq!(session.state(), SessionState::AwaitingInput);
    }

    #[tokio::test]
    async fn substitution_keeps_text_as_typed() {
        let provider = Arc::new(ScriptedProvider::new().exchange(near(0), "ok"));
        let mut session = session_with(provider.clone(), settings());
        session.handle_input("  cubism, maybe?\n").await.unwrap();
        assert_eq!(session.transcript().turns()[1], Turn::user("  cubism, maybe?"));
        assert_eq!(provider.embed_inputs(), vec!["  cubism, maybe?".to_string()]);
    }

    #[tokio::test]
    async fn nearest_document_outside_limit_is_not_sent() {
        let provider = Arc::new(ScriptedProvider::new().exchange(near(4), "ok"));
        let mut session = session_with(provider.clone(), settings());

        let TurnOutcome::Reply { retrieval, .. } = session.handle_input("q").await.unwrap() else {
            panic!("expected a reply");
        };
        assert_eq!(retrieval.ranked[0], 4);
        let composite = &provider.last_request().unwrap().messages[1].content;
        assert!(!composite.contains("<doc4>"));
        assert!(composite.contains("<doc0>") && composite.contains("<doc1>") && composite.contains("<doc2>"));
    }

    #[tokio::test]
    async fn embed_failure_restores_transcript() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .exchange(near(0), "first")
                .embedding(Err(ProviderError::Network("connection reset".into()))),
        );
        let mut session = session_with(provider.clone(), settings());
        session.handle_input("one").await.unwrap();
        let before = session.transcript().turns().to_vec();

        let err = session.handle_input("two").await.unwrap_err();
        assert!(matches!(err, TurnError::Embedding(_)));
        assert!(err.is_retryable());
        assert_eq!(session.transcript().turns(), before.as_slice());
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert_eq!(provider.complete_calls(), 1);
    }

    #[tokio::test]
    async fn completion_failure_restores_transcript() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .embedding(Ok(near(0)))
                .reply(Err(ProviderError::AuthenticationFailed("bad key".into()))),
        );
        let mut session = session_with(provider.clone(), settings());

        let err = session.handle_input("hello").await.unwrap_err();
        assert!(matches!(err, TurnError::Completion(_)));
        assert!(!err.is_retryable());
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_completion_times_out() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .exchange(near(0), "too late")
                .with_reply_delay(Duration::from_secs(3600)),
        );
        let mut session = session_with(provider.clone(), settings());

        let err = session.handle_input("hello").await.unwrap_err();
        assert!(matches!(err, TurnError::Completion(ProviderError::Timeout(_))));
        assert!(err.is_retryable());
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let provider = Arc::new(ScriptedProvider::new().embedding(Ok(vec![1.0, 0.0])));
        let mut session = session_with(provider.clone(), settings());
        let err = session.handle_input("hello").await.unwrap_err();
        assert!(matches!(err, TurnError::DimensionMismatch { expected: 5, found: 2 }));
        assert_eq!(provider.complete_calls(), 0);
    }

    #[tokio::test]
    async fn budget_evicts_old_exchanges() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .exchange(near(0), "a1")
                .exchange(near(0), "a2")
                .exchange(near(0), "a3"),
        );
        // system 10, every other turn 20
        let counter = |turns: &[Turn]| {
            turns
                .iter()
                .map(|t| if t.role == Role::System { 10 } else { 20 })
                .sum::<usize>()
        };
        let settings = SessionSettings {
            max_tokens: 90,
            ..settings()
        };
        let mut session = ChatSession::new(settings, axis_retriever(3), provider.clone(), Box::new(counter));

        session.handle_input("q1").await.unwrap();
        session.handle_input("q2").await.unwrap();
        let TurnOutcome::Reply { budget, .. } = session.handle_input("q3").await.unwrap() else {
            panic!("expected a reply");
        };
        // sys + q1 a1 q2 a2 + composite = 110 → evict q1, a1
        assert_eq!(budget.evicted, 2);
        let turns = session.transcript().turns();
        assert_eq!(turns[0].role, Role::System);
        let contents: Vec<_> = turns[1..].iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["q2", "a2", "q3", "a3"]);
    }

    #[tokio::test]
    async fn closed_session_rejects_input() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut session = session_with(provider, settings());
        session.handle_input("exit").await.unwrap();
        assert!(matches!(session.handle_input("hello").await, Err(TurnError::Closed)));
    }

    #[tokio::test]
    async fn run_stops_at_exit() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .exchange(near(2), "Sculpture, mostly.")
                .embedding(Err(ProviderError::RateLimited { retry_after_secs: 5 })),
        );
        let mut session = session_with(provider.clone(), settings());
        let mut input: VecDeque<String> = ["What did she make?", "", "And later?", "EXIT", "never read"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut output = BufferedOutput::default();

        session.run(&mut input, &mut output).await.unwrap();

        assert!(session.is_closed());
        assert_eq!(output.replies, vec!["Sculpture, mostly.".to_string()]);
        assert_eq!(output.notices.len(), 1);
        assert!(output.notices[0].starts_with("Error: Embedding request failed"));
        assert_eq!(input.len(), 1);
    }

    #[tokio::test]
    async fn run_closes_on_end_of_input() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut session = session_with(provider, settings());
        let mut input: VecDeque<String> = VecDeque::new();
        let mut output = BufferedOutput::default();
        session.run(&mut input, &mut output).await.unwrap();
        assert!(session.is_closed());
        assert!(output.replies.is_empty());
    }

    #[tokio::test]
    async fn oversized_system_prompt_is_a_notice() {
        let provider = Arc::new(ScriptedProvider::new().exchange(near(0), "Still here."));
        let settings = SessionSettings {
            max_tokens: 5,
            ..settings()
        };
        let mut session = session_with(provider.clone(), settings);
        let mut input: VecDeque<String> = VecDeque::from(vec!["hello".to_string()]);
        let mut output = BufferedOutput::default();

        session.run(&mut input, &mut output).await.unwrap();

        assert_eq!(output.replies, vec!["Still here.".to_string()]);
        assert!(output.notices[0].starts_with("Warning:"));
        // the composite still goes out with the system turn
        let sent = provider.last_request().unwrap();
        assert_eq!(sent.messages.len(), 2);
        assert_eq!(sent.messages[1].role, Role::User);
        assert_eq!(session.transcript().turns()[1], Turn::user("hello"));
    }

    #[tokio::test]
    async fn large_context_block_keeps_the_question() {
        let docs = (0..3)
            .map(|i| {
                let mut e = vec![0.0; 3];
                e[i] = 1.0;
                Document::new("x".repeat(100), e)
            })
            .collect();
        let retriever = Arc::new(Retriever::new(Arc::new(Corpus::new(docs).unwrap()), 3));
        let provider = Arc::new(
            ScriptedProvider::new()
                .exchange(vec![1.0, 0.0, 0.0], "a1")
                .exchange(vec![0.0, 1.0, 0.0], "a2"),
        );
        let counter = |turns: &[Turn]| turns.iter().map(|t| t.content.len()).sum::<usize>();
        let settings = SessionSettings {
            system_prompt: "sys".into(),
            max_tokens: 200,
            ..settings()
        };
        let mut session = ChatSession::new(settings, retriever, provider.clone(), Box::new(counter));
        let mut input: VecDeque<String> =
            ["Which sculptor?", "And the painter?"].into_iter().map(String::from).collect();
        let mut output = BufferedOutput::default();

        session.run(&mut input, &mut output).await.unwrap();

        let sent = provider.last_request().unwrap();
        let roles: Vec<_> = sent.messages.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
        assert!(sent.messages[1].content.contains("QUERY: And the painter?"));
        assert_eq!(output.replies, vec!["a1".to_string(), "a2".to_string()]);
        assert_eq!(output.notices.len(), 2);
        assert!(output.notices.iter().all(|n| n.starts_with("Warning:")));

        let turns = session.transcript().turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1], Turn::user("And the painter?"));
        assert_eq!(turns[2], Turn::assistant("a2"));
    }

    #[tokio::test]
    async fn empty_corpus_sends_empty_context() {
        let provider = Arc::new(ScriptedProvider::new().exchange(vec![0.3, 0.4], "Nothing on file."));
        let retriever = Arc::new(Retriever::new(Arc::new(Corpus::empty()), 3));
        let counter = |turns: &[Turn]| turns.iter().map(|t| t.content.len()).sum::<usize>();
        let mut session = ChatSession::new(settings(), retriever, provider.clone(), Box::new(counter));

        let TurnOutcome::Reply { retrieval, .. } = session.handle_input("Any etchings?").await.unwrap() else {
            panic!("expected a reply");
        };
        assert!(retrieval.selected.is_empty());
        let composite = &provider.last_request().unwrap().messages[1].content;
        assert_eq!(composite, "Be brief. QUERY: Any etchings?\n\nCONTEXT:");
    }
}
