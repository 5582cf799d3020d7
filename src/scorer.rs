//! Similarity scoring between one control text and many clause texts.
//!
//! Scores are cosine similarities between sentence embeddings. Clause
//! embeddings are computed in one batched provider call; the control text
//! adds a second call. A blank control short-circuits to a zero vector
//! without touching the provider at all — empty input has no meaningful
//! embedding and the model call would be wasted.

use anyhow::Result;

use crate::embedding::{cosine_similarity, EmbeddingProvider};

/// Score `control_text` against each clause text.
///
/// Returns one score per clause, in clause order. A control that is blank
/// after trimming yields all zeros without invoking the provider.
pub fn score(
    provider: &dyn EmbeddingProvider,
    control_text: &str,
    clause_texts: &[String],
) -> Result<Vec<f32>> {
    if control_text.trim().is_empty() {
        return Ok(vec![0.0; clause_texts.len()]);
    }

    let clause_vectors = provider.embed(clause_texts)?;
    score_against(provider, control_text, &clause_vectors)
}

/// Score `control_text` against precomputed clause embeddings.
///
/// This is the batched path: the matcher embeds the clause corpus once per
/// run and scores every control against the same vectors.
pub fn score_against(
    provider: &dyn EmbeddingProvider,
    control_text: &str,
    clause_vectors: &[Vec<f32>],
) -> Result<Vec<f32>> {
    if control_text.trim().is_empty() {
        return Ok(vec![0.0; clause_vectors.len()]);
    }

    let control_vectors = provider.embed(&[control_text.to_string()])?;
    let control = control_vectors
        .first()
        .ok_or_else(|| anyhow::anyhow!("Empty embedding response for control text"))?;

    Ok(clause_vectors
        .iter()
        .map(|clause| cosine_similarity(control, clause))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that counts embed calls and returns fixed unit vectors.
    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EmbeddingProvider for CountingProvider {
        fn model_name(&self) -> &str {
            "counting"
        }
        fn dims(&self) -> usize {
            3
        }
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
        }
    }

    fn clauses(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("clause {}", i)).collect()
    }

    #[test]
    fn score_returns_one_score_per_clause() {
        let provider = CountingProvider::new();
        let scores = score(&provider, "we encrypt data at rest", &clauses(4)).unwrap();
        assert_eq!(scores.len(), 4);
    }

    #[test]
    fn blank_control_returns_zeros_without_embedding() {
        let provider = CountingProvider::new();
        let scores = score(&provider, "   \n\t ", &clauses(3)).unwrap();
        assert_eq!(scores, vec![0.0, 0.0, 0.0]);
        assert_eq!(provider.call_count(), 0, "provider must not be invoked");
    }

    #[test]
    fn empty_control_returns_zeros_without_embedding() {
        let provider = CountingProvider::new();
        let scores = score(&provider, "", &clauses(2)).unwrap();
        assert_eq!(scores, vec![0.0, 0.0]);
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn non_blank_control_uses_two_batched_calls() {
        let provider = CountingProvider::new();
        score(&provider, "access control policy", &clauses(10)).unwrap();
        // One call for the clause batch, one for the control.
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn score_against_reuses_precomputed_vectors() {
        let provider = CountingProvider::new();
        let clause_vectors = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];

        let scores = score_against(&provider, "retention policy", &clause_vectors).unwrap();
        assert_eq!(scores.len(), 2);
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!(scores[1].abs() < 1e-6);
        assert_eq!(provider.call_count(), 1, "only the control is embedded");
    }
}
