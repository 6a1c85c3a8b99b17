//! Budget enforcement by evicting the oldest non-system turn.

use docent_config::BudgetStrictness;
use docent_core::message::Transcript;
use tracing::{debug, warn};

use super::token::TokenCounter;

/// What one pass of [`enforce_budget`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetOutcome {
    /// Turns removed from the front of the conversation
    pub evicted: usize,
    /// Token count after eviction
    pub tokens: usize,
    /// False when the turns that may not be evicted still exceed the budget
    pub fits: bool,
}

fn over_budget(tokens: usize, max_tokens: usize, strictness: BudgetStrictness) -> bool {
    match strictness {
        BudgetStrictness::Strict => tokens >= max_tokens,
        BudgetStrictness::Inclusive => tokens > max_tokens,
    }
}

/// Evict turns at index 1 until the transcript fits `max_tokens`.
///
/// Stops early when only the system turn remains; the outcome then reports
/// `fits: false` and the caller decides how to surface it. Running it again
/// on the result evicts nothing.
pub fn enforce_budget(
    transcript: &mut Transcript,
    max_tokens: usize,
    counter: &dyn TokenCounter,
    strictness: BudgetStrictness,
) -> BudgetOutcome {
    evict_until_fits(transcript, max_tokens, counter, strictness, 0)
}

/// Like [`enforce_budget`], but never evicts the newest turn.
///
/// Used while a composite turn is waiting to be sent: eviction stops at
/// the system turn plus that turn, and `fits: false` reports that the
/// pair alone is over budget.
pub fn enforce_budget_keeping_latest(
    transcript: &mut Transcript,
    max_tokens: usize,
    counter: &dyn TokenCounter,
    strictness: BudgetStrictness,
) -> BudgetOutcome {
    evict_until_fits(transcript, max_tokens, counter, strictness, 1)
}

fn evict_until_fits(
    transcript: &mut Transcript,
    max_tokens: usize,
    counter: &dyn TokenCounter,
    strictness: BudgetStrictness,
    keep_latest: usize,
) -> BudgetOutcome {
    let mut tokens = counter.count(transcript.turns());
    let mut evicted = 0;

    while over_budget(tokens, max_tokens, strictness) && transcript.len() > 1 + keep_latest {
        if transcript.evict_oldest().is_none() {
            break;
        }
        evicted += 1;
        tokens = counter.count(transcript.turns());
    }

    let fits = !over_budget(tokens, max_tokens, strictness);
    if !fits {
        warn!(
            tokens,
            max_tokens,
            kept = transcript.len(),
            "Transcript exceeds the token budget after eviction"
        );
    } else if evicted > 0 {
        debug!(evicted, tokens, max_tokens, "Evicted oldest turns");
    }

    BudgetOutcome {
        evicted,
        tokens,
        fits,
    }
}
