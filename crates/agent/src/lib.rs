//! The grounded chat session — the heart of Docent.
//!
//! Every user line goes through the same cycle:
//!
//! 1. **Embed** the query via the configured provider
//! 2. **Retrieve** context from the corpus by vector distance
//! 3. **Compose** a user turn from instructions, query, and context
//! 4. **Budget** the transcript, evicting the oldest turns
//! 5. **Complete** and return the reply to the output channel
//!
//! After the reply arrives the composite turn is replaced by the bare
//! query, so the transcript only carries what the user actually said.

pub mod context;
pub mod prompt;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{
    BpeTokenCounter, BudgetOutcome, HeuristicTokenCounter, ModelOverheads, TokenCounter,
    TokenizerError, counter_from_config, enforce_budget, enforce_budget_keeping_latest,
    estimate_tokens,
};
pub use prompt::compose_prompt;
pub use session::{
    ChatSession, EXIT_COMMAND, SessionSettings, SessionState, TurnError, TurnOutcome,
};
