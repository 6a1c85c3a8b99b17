//! Vector distance and ranking.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity / cosine distance
//! - Euclidean (L2) distance
//! - Full-corpus ranking by ascending distance

use std::cmp::Ordering;

use docent_core::corpus::Corpus;
use docent_core::retrieval::DistanceMetric;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Euclidean distance. Mismatched lengths yield `f32::INFINITY`.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x as f64) - (*y as f64);
            d * d
        })
        .sum::<f64>()
        .sqrt() as f32
}

/// Distance between two vectors under `metric`. Lower = more similar.
pub fn distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
        DistanceMetric::L2 => l2_distance(a, b),
    }
}

/// Rank every corpus index by ascending distance to `query`.
///
/// Returns a permutation of `0..corpus.len()`, nearest first. The sort is
/// stable, so equal distances keep corpus order; NaN distances go last.
/// An empty corpus yields an empty list.
pub fn rank(query: &[f32], corpus: &Corpus, metric: DistanceMetric) -> Vec<usize> {
    let mut scored: Vec<(usize, f32)> = corpus
        .documents()
        .iter()
        .enumerate()
        .map(|(i, doc)| (i, distance(metric, query, &doc.embedding)))
        .collect();

    scored.sort_by(|a, b| compare_distance(a.1, b.1));
    scored.into_iter().map(|(i, _)| i).collect()
}

fn compare_distance(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
