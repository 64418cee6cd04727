//! Classifier seam: the pretrained model is a black box behind [`Classifier`].

pub mod model;
#[cfg(feature = "onnx")]
pub mod onnx;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::PipelineError;
use crate::features::shaper::{FeatureTensor, InputShape};

/// Vocabulary of the speech commands model, in score order.
pub const SPEECH_COMMANDS_LABELS: [&str; 20] = [
    "_background_noise_",
    "_unknown_",
    "down",
    "eight",
    "five",
    "four",
    "go",
    "left",
    "nine",
    "no",
    "one",
    "right",
    "seven",
    "six",
    "stop",
    "three",
    "two",
    "up",
    "yes",
    "zero",
];

/// What a loaded model reports about itself. Read once at startup.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelMetadata {
    pub sample_rate_hz: u32,
    pub fft_size: usize,
    pub input_shape: InputShape,
    /// Score index `i` belongs to `labels[i]`.
    pub labels: Vec<String>,
}

impl ModelMetadata {
    pub fn speech_commands() -> Self {
        Self {
            sample_rate_hz: 44_100,
            fft_size: 1024,
            input_shape: InputShape::SPEECH_COMMANDS,
            labels: SPEECH_COMMANDS_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Apply a `metadata.json` sidecar (`words`, optional rate/FFT/frame size).
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let file: MetadataFile = serde_json::from_str(json)
            .map_err(|e| PipelineError::ModelUnavailable(format!("invalid model metadata: {e}")))?;

        if file.words.is_empty() {
            return Err(PipelineError::ModelUnavailable(
                "model metadata lists no words".into(),
            ));
        }

        let mut meta = Self::speech_commands();
        if file.words != meta.labels {
            log::warn!(
                "Model vocabulary differs from the built-in speech commands table ({} labels)",
                file.words.len()
            );
        }
        meta.labels = file.words;
        if let Some(rate) = file.sample_rate_hz {
            meta.sample_rate_hz = rate;
        }
        if let Some(fft) = file.fft_size {
            meta.fft_size = fft;
        }
        if let Some(bins) = file.frame_size {
            meta.input_shape.freq_bins = bins;
        }
        Ok(meta)
    }

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::ModelUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// `metadata.json` beside the model when present, otherwise the built-in table.
    pub fn for_model(model_path: &Path) -> Result<Self, PipelineError> {
        let sidecar = model_path.with_file_name("metadata.json");
        if sidecar.exists() {
            log::info!("Reading model metadata from {}", sidecar.display());
            Self::load(&sidecar)
        } else {
            Ok(Self::speech_commands())
        }
    }
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self::speech_commands()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataFile {
    words: Vec<String>,
    sample_rate_hz: Option<u32>,
    fft_size: Option<usize>,
    frame_size: Option<usize>,
}

/// A loaded, reusable model handle.
///
/// Implementations must be callable from several requests at once; a backend
/// that can't run concurrently serializes internally.
pub trait Classifier: Send + Sync {
    fn metadata(&self) -> &ModelMetadata;

    /// Scores aligned with `metadata().labels`.
    fn classify(&self, input: &FeatureTensor) -> Result<Vec<f32>, PipelineError>;

    fn labels(&self) -> &[String] {
        &self.metadata().labels
    }
}

/// Load the model at `model_path` once and hand back a shareable handle.
#[cfg(feature = "onnx")]
pub fn load(
    model_path: &Path,
    metadata_path: Option<&Path>,
) -> Result<Arc<dyn Classifier>, PipelineError> {
    let metadata = match metadata_path {
        Some(path) => ModelMetadata::load(path)?,
        None => ModelMetadata::for_model(model_path)?,
    };
    let classifier = onnx::OnnxClassifier::load(model_path, metadata)?;
    Ok(Arc::new(classifier))
}

#[cfg(not(feature = "onnx"))]
pub fn load(
    model_path: &Path,
    _metadata_path: Option<&Path>,
) -> Result<Arc<dyn Classifier>, PipelineError> {
    Err(PipelineError::ModelUnavailable(format!(
        "cannot load {}: built without the 'onnx' feature",
        model_path.display()
    )))
}
