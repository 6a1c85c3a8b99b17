//! Conversation budget.
//!
//! A transcript grows by one composite user turn and one assistant turn per
//! exchange. Before each completion request the budgeter drops the oldest
//! non-system turns until the transcript fits the configured token budget.
//!
//! | Turn | Trim Strategy |
//! |------|---------------|
//! | System (index 0) | Never trimmed |
//! | User / Assistant | Oldest dropped first (index 1) |

pub mod budget;
pub mod token;

pub use budget::{BudgetOutcome, enforce_budget, enforce_budget_keeping_latest};
pub use token::{
    BpeTokenCounter, HeuristicTokenCounter, ModelOverheads, TokenCounter, TokenizerError,
    counter_from_config, estimate_tokens,
};
