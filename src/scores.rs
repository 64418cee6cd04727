//! Pairing classifier scores with vocabulary labels and picking results.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::DEFAULT_THRESHOLD;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredLabel {
    pub word: String,
    pub score: f32,
}

/// How a score vector is turned into a response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every label scoring at or above the threshold.
    #[default]
    Filter,
    /// The single best label.
    Top1,
}

/// Response body, shaped like the two historical endpoints.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Recognition {
    Filtered { word: Vec<ScoredLabel> },
    Top { words: ScoredLabel },
}

/// Zip scores with labels by index.
pub fn label_scores(labels: &[String], scores: &[f32]) -> Vec<ScoredLabel> {
    labels
        .iter()
        .zip(scores)
        .map(|(word, &score)| ScoredLabel {
            word: word.clone(),
            score,
        })
        .collect()
}

/// Labels with `score >= threshold`, in label order. May be empty.
pub fn filter_scores(labels: &[String], scores: &[f32], threshold: f32) -> Vec<ScoredLabel> {
    label_scores(labels, scores)
        .into_iter()
        .filter(|s| s.score >= threshold)
        .collect()
}

/// The label with the strictly greatest score; the first one wins ties.
///
/// NaN scores are never picked. If every score is NaN there is no top label.
pub fn top_score(labels: &[String], scores: &[f32]) -> Result<ScoredLabel, PipelineError> {
    if scores.is_empty() || scores.len() != labels.len() {
        return Err(PipelineError::EmptyScoreSet {
            got: scores.len(),
            expected: labels.len(),
        });
    }

    label_scores(labels, scores)
        .into_iter()
        .filter(|s| !s.score.is_nan())
        .reduce(|best, next| if next.score > best.score { next } else { best })
        .ok_or(PipelineError::EmptyScoreSet {
            got: 0,
            expected: labels.len(),
        })
}

/// Apply `mode` to a score vector.
pub fn select(
    labels: &[String],
    scores: &[f32],
    mode: Mode,
    threshold: Option<f32>,
) -> Result<Recognition, PipelineError> {
    match mode {
        Mode::Filter => Ok(Recognition::Filtered {
            word: filter_scores(labels, scores, threshold.unwrap_or(DEFAULT_THRESHOLD)),
        }),
        Mode::Top1 => top_score(labels, scores).map(|words| Recognition::Top { words }),
    }
}
