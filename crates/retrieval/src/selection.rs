//! Context selection — turns a ranked list into the block injected into a prompt.

use docent_core::corpus::Corpus;
use docent_core::retrieval::ContextPolicy;

/// Apply the context limit to a ranked list.
///
/// - [`ContextPolicy::ByCorpusPosition`]: keep every ranked index whose corpus
///   index is below `limit`, in rank order. The result is always a subset of
///   `0..limit`, no matter how the query ranked them.
/// - [`ContextPolicy::ByRankOrder`]: keep the first `limit` ranked indices.
pub fn select(ranked: &[usize], limit: usize, policy: ContextPolicy) -> Vec<usize> {
    match policy {
        ContextPolicy::ByCorpusPosition => ranked.iter().copied().filter(|&i| i < limit).collect(),
        ContextPolicy::ByRankOrder => ranked.iter().copied().take(limit).collect(),
    }
}

/// Concatenate the texts of `selected` documents in the given order.
///
/// Indices outside the corpus are skipped. No selection → empty string.
pub fn build_context_block(corpus: &Corpus, selected: &[usize]) -> String {
    selected
        .iter()
        .filter_map(|&i| corpus.get(i))
        .map(|doc| doc.text.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_core::corpus::Document;

    fn corpus(n: usize) -> Corpus {
        Corpus::new(
            (0..n)
                .map(|i| Document::new(format!("[{i}]"), vec![i as f32 + 1.0]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn corpus_position_ignores_rank_for_membership() {
        let ranked = vec![4, 2, 0, 3, 1];
        assert_eq!(select(&ranked, 3, ContextPolicy::ByCorpusPosition), vec![2, 0, 1]);
    }

    #[test]
    fn rank_order_takes_leading_ranks() {
        let ranked = vec![4, 2, 0, 3, 1];
        assert_eq!(select(&ranked, 3, ContextPolicy::ByRankOrder), vec![4, 2, 0]);
    }

    #[test]
    fn zero_limit_selects_nothing() {
        let ranked = vec![1, 0];
        assert!(select(&ranked, 0, ContextPolicy::ByCorpusPosition).is_empty());
        assert!(select(&ranked, 0, ContextPolicy::ByRankOrder).is_empty());
    }

    #[test]
    fn limit_beyond_corpus_keeps_everything() {
        let ranked = vec![1, 0, 2];
        assert_eq!(select(&ranked, 20, ContextPolicy::ByCorpusPosition), ranked);
        assert_eq!(select(&ranked, 20, ContextPolicy::ByRankOrder), ranked);
    }

    #[test]
    fn context_block_concatenates_in_selection_order() {
        let c = corpus(5);
        assert_eq!(build_context_block(&c, &[2, 0, 1]), "[2][0][1]");
    }

    #[test]
    fn empty_selection_is_empty_string() {
        assert_eq!(build_context_block(&corpus(3), &[]), "");
        assert_eq!(build_context_block(&Corpus::empty(), &[0, 1]), "");
    }
}
