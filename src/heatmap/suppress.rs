//! Local suppression of redundant high scores.
//!
//! Walking forward, every candidate at or above the threshold competes with
//! the earlier candidates in its window that are similar to it (or directly
//! precede it). The loser is clamped just below the threshold, so only the
//! locally dominant span stays highlighted. Scores only ever decrease.

use super::similarity::SimilarityMatrix;
use crate::config::SuppressionConfig;

/// Margin below the threshold that demoted scores are clamped to.
const DEMOTION_MARGIN: f32 = 0.01;

pub fn suppress_scores(scores: &mut [f32], matrix: &SimilarityMatrix, config: &SuppressionConfig) {
    let threshold = config.threshold;
    let demoted = threshold - DEMOTION_MARGIN;

    for i in 0..scores.len() {
        if scores[i] < threshold {
            scores[i] = scores[i].min(demoted);
            continue;
        }

        let window_start = i.saturating_sub(config.similarity_window);
        for j in (window_start..i).rev() {
            let competes =
                matrix.get(i, j) > threshold || i - j <= config.significant_window;
            if !competes {
                continue;
            }

            if scores[i] > scores[j] {
                scores[j] = scores[j].min(demoted);
            } else {
                scores[i] = scores[i].min(demoted);
                break;
            }
        }
    }
}
