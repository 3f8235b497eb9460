//! Vector math and similarity ranking for embeddings.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EmbeddingError, Result};
use crate::{Embedding, IdeaId};

/// Euclidean length of a vector.
///
/// Accumulated in `f64` so squares of very small or very large `f32`
/// components neither vanish nor overflow.
pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter().map(|&x| f64::from(x).powi(2)).sum::<f64>().sqrt()
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

/// Whether `v` has unit length within `tolerance`.
pub fn is_unit_length(v: &[f32], tolerance: f32) -> bool {
    !v.is_empty() && (l2_norm(v) - 1.0).abs() <= f64::from(tolerance)
}

/// Scale an embedding to unit length.
///
/// Empty and all-zero vectors have no direction and are rejected with
/// [`EmbeddingError::DegenerateVector`].
pub fn normalize(embedding: &[f32]) -> Result<Embedding> {
    let magnitude = l2_norm(embedding);
    if embedding.is_empty() || magnitude == 0.0 || !magnitude.is_finite() {
        return Err(EmbeddingError::DegenerateVector);
    }

    Ok(embedding
        .iter()
        .map(|&x| (f64::from(x) / magnitude) as f32)
        .collect())
}

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
///
/// A zero vector on either side yields exactly 0.0 so that one corrupt
/// record only sinks in the ranking.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let magnitude_a = l2_norm(a);
    let magnitude_b = l2_norm(b);

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    let similarity = dot(a, b) / (magnitude_a * magnitude_b);
    if !similarity.is_finite() {
        // NaN components
        return Ok(0.0);
    }

    // Rounding can push a self-comparison a hair past 1.0.
    Ok(similarity.clamp(-1.0, 1.0) as f32)
}

/// A candidate idea with its similarity to a query vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredIdea {
    /// ID of the matched idea.
    pub idea_id: IdeaId,

    /// Cosine similarity to the query.
    pub score: f32,
}

/// Score every candidate against `query` and rank the ones at or above
/// `min_score`.
///
/// Results are ordered by score descending, ties by ascending idea id.
/// Candidates whose dimension differs from the query are logged and skipped.
pub fn rank_candidates<'a, I>(query: &[f32], candidates: I, min_score: f32) -> Vec<ScoredIdea>
where
    I: IntoIterator<Item = (IdeaId, &'a [f32])>,
{
    let mut scores: Vec<(OrderedFloat<f32>, IdeaId)> = Vec::new();

    for (idea_id, embedding) in candidates {
        match cosine_similarity(query, embedding) {
            Ok(score) if score >= min_score => scores.push((OrderedFloat(score), idea_id)),
            Ok(_) => {}
            Err(e) => warn!("Skipping idea {idea_id} in similarity scan: {e}"),
        }
    }

    scores.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    scores
        .into_iter()
        .map(|(score, idea_id)| ScoredIdea {
            idea_id,
            score: score.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_unit_length() {
        for v in [
            vec![3.0, 4.0],
            vec![0.001, 0.0, 0.0],
            vec![-5.0, 12.0, 2.5, 100.0],
            vec![1e-3; 384],
        ] {
            let n = normalize(&v).unwrap();
            assert!((l2_norm(&n) - 1.0).abs() < 1e-6, "norm of {v:?}");
        }
    }

    #[test]
    fn test_normalize_extreme_magnitudes() {
        let tiny = normalize(&[1e-23, 0.0]).unwrap();
        assert_eq!(tiny, vec![1.0, 0.0]);

        let huge = normalize(&[1e20, 1e20]).unwrap();
        assert!(is_unit_length(&huge, 1e-6));
        assert!((huge[0] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_extreme_magnitudes() {
        let huge = [1e20, 1e20];
        let sim = cosine_similarity(&huge, &huge).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);

        let tiny = [1e-23, 0.0];
        let sim = cosine_similarity(&tiny, &[1.0, 0.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize() {
        let v = normalize(&[3.0, 4.0]).unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_rejects_degenerate() {
        assert!(matches!(
            normalize(&[0.0, 0.0, 0.0]),
            Err(EmbeddingError::DegenerateVector)
        ));
        assert!(matches!(normalize(&[]), Err(EmbeddingError::DegenerateVector)));
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![0.3, -1.2, 4.0];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 2.0, -3.0];
        let b: Vec<f32> = a.iter().map(|x| -x).collect();
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_symmetric() {
        let a = vec![0.2, 0.7, -0.1];
        let b = vec![0.9, -0.3, 0.4];
        assert_eq!(
            cosine_similarity(&a, &b).unwrap(),
            cosine_similarity(&b, &a).unwrap()
        );
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let sim = cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap();
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(matches!(
            cosine_similarity(&a, &b),
            Err(EmbeddingError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_rank_candidates() {
        let query = vec![1.0, 0.0, 0.0];
        let a = vec![1.0, 0.0, 0.0]; // similarity 1.0
        let b = vec![0.0, 1.0, 0.0]; // similarity 0.0
        let c = vec![0.7, 0.7, 0.0]; // similarity ~0.7
        let candidates = vec![(3, b.as_slice()), (1, a.as_slice()), (2, c.as_slice())];

        let results = rank_candidates(&query, candidates, 0.5);
        let ids: Vec<IdeaId> = results.iter().map(|r| r.idea_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_rank_candidates_ties_by_idea_id() {
        let query = vec![1.0, 0.0];
        let same = vec![0.6, 0.8];
        let candidates = vec![(9, same.as_slice()), (4, same.as_slice()), (7, same.as_slice())];

        let ids: Vec<IdeaId> = rank_candidates(&query, candidates, 0.0)
            .into_iter()
            .map(|r| r.idea_id)
            .collect();
        assert_eq!(ids, vec![4, 7, 9]);
    }

    #[test]
    fn test_rank_candidates_skips_mismatched_dimension() {
        let query = vec![1.0, 0.0];
        let good = vec![1.0, 0.0];
        let bad = vec![1.0, 0.0, 0.0];
        let candidates = vec![(1, bad.as_slice()), (2, good.as_slice())];

        let results = rank_candidates(&query, candidates, 0.0);
        assert_eq!(
            results,
            vec![ScoredIdea {
                idea_id: 2,
                score: 1.0
            }]
        );
    }
}
