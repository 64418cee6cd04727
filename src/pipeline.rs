//! One recognition pass: samples -> frames -> spectra -> tensor -> scores -> result.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::classifier::{Classifier, ModelMetadata};
use crate::error::PipelineError;
use crate::features::frames::extract_frames;
use crate::features::shaper::{FeatureShaper, FeatureTensor};
use crate::features::spectrum::SpectralAnalyzer;
use crate::scores::{self, Mode, Recognition};
use crate::FRAME_LENGTH;

/// Reusable recognizer around one loaded classifier.
///
/// Cloning is cheap and every clone shares the same model handle; all
/// intermediate buffers belong to the call that made them.
#[derive(Clone)]
pub struct Recognizer {
    classifier: Arc<dyn Classifier>,
    analyzer: SpectralAnalyzer,
    shaper: FeatureShaper,
}

impl Recognizer {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        let shaper = FeatureShaper::new(classifier.metadata().input_shape);
        Self {
            classifier,
            analyzer: SpectralAnalyzer::new(FRAME_LENGTH),
            shaper,
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        self.classifier.metadata()
    }

    /// Classifier input for `samples`. Degenerate audio yields an all-zero tensor.
    pub fn features(&self, samples: &[f32]) -> Result<FeatureTensor, PipelineError> {
        let frames = extract_frames(samples)?;
        let spectrogram = self.analyzer.analyze(&frames);
        self.shaper.shape(&spectrogram)
    }

    /// Raw label-aligned scores for `samples`.
    pub fn scores(&self, samples: &[f32]) -> Result<Vec<f32>, PipelineError> {
        let input = self.features(samples)?;
        let scores = self.classifier.classify(&input)?;

        let expected = self.classifier.labels().len();
        if scores.len() != expected {
            log::warn!(
                "Classifier returned {} scores for {} labels",
                scores.len(),
                expected
            );
        }
        Ok(scores)
    }

    pub fn recognize(
        &self,
        samples: &[f32],
        mode: Mode,
        threshold: f32,
    ) -> Result<Recognition, PipelineError> {
        let start = Instant::now();
        let raw = self.scores(samples)?;
        let result = scores::select(self.classifier.labels(), &raw, mode, Some(threshold))?;
        log::debug!(
            "Recognized {} samples in {:.1}ms",
            samples.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(result)
    }

    /// Like [`recognize`](Self::recognize), but gives up after `timeout`.
    ///
    /// The pass runs on a detached worker thread; a late result is discarded.
    pub fn recognize_within(
        &self,
        samples: Vec<f32>,
        mode: Mode,
        threshold: f32,
        timeout: Duration,
    ) -> Result<Recognition, PipelineError> {
        let (tx, rx) = mpsc::channel();
        let worker = self.clone();

        let spawned = std::thread::Builder::new()
            .name("speechcmd-recognize".into())
            .spawn(move || {
                let _ = tx.send(worker.recognize(&samples, mode, threshold));
            });

        if let Err(err) = spawned {
            return Err(PipelineError::Worker(format!("cannot start thread: {err}")));
        }

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(PipelineError::Timeout(timeout)),
            // The sender only drops unsent when the pass panicked.
            Err(RecvTimeoutError::Disconnected) => {
                Err(PipelineError::Worker("exited without a result".into()))
            }
        }
    }
}
