//! TextRank over a dense sentence similarity graph.
//!
//! Plain power iteration without damping: every sentence receives the
//! similarity-weighted sum of the other sentences' scores. Scores are then
//! min-max rescaled, so only their relative order and spacing matter.

use super::similarity::SimilarityMatrix;

/// Score every node of `matrix`, returning values rescaled to [0, 1].
///
/// Stops early once the summed absolute change between iterations drops
/// below `tolerance`. Degenerate inputs (fewer than two nodes, or all final
/// scores equal) score 0.0 everywhere.
pub fn text_rank(matrix: &SimilarityMatrix, max_iterations: usize, tolerance: f32) -> Vec<f32> {
    let n = matrix.len();
    if n == 0 {
        return vec![];
    }

    // accumulate in f64, raw scores grow geometrically without damping
    let mut scores = vec![1.0 / n as f64; n];
    for iteration in 0..max_iterations {
        let new_scores: Vec<f64> = (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&j| j != i)
                    .map(|j| matrix.get(i, j) as f64 * scores[j])
                    .sum()
            })
            .collect();

        let delta: f64 = scores
            .iter()
            .zip(&new_scores)
            .map(|(old, new)| (old - new).abs())
            .sum();
        scores = new_scores;

        if delta < tolerance as f64 {
            log::trace!("TextRank converged after {} iterations", iteration + 1);
            break;
        }
    }

    rescale(&scores)
}

/// Min-max rescale to [0, 1]; constant or non-finite input maps to all zeros.
fn rescale(scores: &[f64]) -> Vec<f32> {
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if scores.len() < 2 || !range.is_finite() || range <= f64::EPSILON {
        return vec![0.0; scores.len()];
    }

    scores
        .iter()
        .map(|s| ((s - min) / range) as f32)
        .collect()
}
