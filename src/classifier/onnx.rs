use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;

use super::{Classifier, ModelMetadata};
use crate::error::PipelineError;
use crate::features::shaper::FeatureTensor;

fn unavailable(what: &str, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::ModelUnavailable(format!("{what}: {err}"))
}

/// Speech commands model exported to ONNX.
///
/// `Session::run` needs exclusive access, so concurrent requests queue on the mutex.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    metadata: ModelMetadata,
}

impl OnnxClassifier {
    pub fn load(model_path: &Path, metadata: ModelMetadata) -> Result<Self, PipelineError> {
        let session = build_session(model_path)
            .map_err(|e| unavailable(&format!("failed to load {}", model_path.display()), e))?;

        log::info!(
            "Loaded classifier {} ({} labels, {}Hz, fft {})",
            model_path.display(),
            metadata.labels.len(),
            metadata.sample_rate_hz,
            metadata.fft_size
        );

        Ok(Self {
            session: Mutex::new(session),
            metadata,
        })
    }
}

fn build_session(model_path: &Path) -> Result<Session, String> {
    Session::builder()
        .map_err(|e| e.to_string())?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| e.to_string())?
        .with_intra_threads(1)
        .map_err(|e| e.to_string())?
        .with_inter_threads(1)
        .map_err(|e| e.to_string())?
        .commit_from_file(model_path)
        .map_err(|e| e.to_string())
}

impl Classifier for OnnxClassifier {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn classify(&self, input: &FeatureTensor) -> Result<Vec<f32>, PipelineError> {
        let tensor = Tensor::from_array(input.clone())
            .map_err(|e| unavailable("failed to build input tensor", e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PipelineError::ModelUnavailable("classifier session poisoned".into()))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| unavailable("inference failed", e))?;

        let output: ndarray::ArrayViewD<f32> = outputs[0]
            .try_extract_array()
            .map_err(|e| unavailable("failed to extract classifier output", e))?;

        // Output is [1, labels] or [labels]; either way the flat order is label order.
        Ok(output.iter().copied().collect())
    }
}
