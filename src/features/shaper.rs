use ndarray::Array4;
use serde::Serialize;

use super::Spectrogram;
use crate::error::PipelineError;

/// Classifier input as `[batch, time_steps, freq_bins, channels]`.
pub type FeatureTensor = Array4<f32>;

/// Fixed input geometry a classifier expects (batch is always 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct InputShape {
    pub time_steps: usize,
    pub freq_bins: usize,
    pub channels: usize,
}

impl InputShape {
    /// Browser-FFT speech commands model: 43 frames of 232 bins, one channel.
    pub const SPEECH_COMMANDS: InputShape = InputShape {
        time_steps: 43,
        freq_bins: 232,
        channels: 1,
    };

    /// Elements per batch item.
    pub fn required_values(&self) -> usize {
        self.time_steps * self.freq_bins * self.channels
    }

    pub fn dims(&self) -> [usize; 4] {
        [1, self.time_steps, self.freq_bins, self.channels]
    }
}

impl Default for InputShape {
    fn default() -> Self {
        Self::SPEECH_COMMANDS
    }
}

/// Flattens, resizes and normalizes a spectrogram into a classifier tensor.
#[derive(Clone, Copy, Debug, Default)]
pub struct FeatureShaper {
    shape: InputShape,
}

impl FeatureShaper {
    pub fn new(shape: InputShape) -> Self {
        Self { shape }
    }

    pub fn shape(&self, spectrogram: &Spectrogram) -> Result<FeatureTensor, PipelineError> {
        self.shape_values(spectrogram.values.clone())
    }

    /// Shape an already-flattened row-major sequence.
    pub fn shape_values(&self, values: Vec<f32>) -> Result<FeatureTensor, PipelineError> {
        let required = self.shape.required_values();
        if values.len() != required {
            log::debug!(
                "{} feature values {} to {}",
                values.len(),
                if values.len() < required { "padded" } else { "truncated" },
                required
            );
        }

        let mut values = resize(values, required);
        normalize(&mut values);

        let [batch, time, freq, channels] = self.shape.dims();
        Ok(Array4::from_shape_vec((batch, time, freq, channels), values)?)
    }
}

/// Zero-pad at the tail or drop from the tail until `values.len() == required`.
pub fn resize(mut values: Vec<f32>, required: usize) -> Vec<f32> {
    values.resize(required, 0.0);
    values
}

/// Zero every non-finite element and scale by the largest finite element.
///
/// When nothing finite and positive remains the result is all zero.
/// Returns the scale that was applied.
pub fn normalize(values: &mut [f32]) -> Option<f32> {
    let max_val = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<f32>, v| Some(acc.map_or(v, |m| m.max(v))));

    match max_val {
        Some(max) if max > 0.0 => {
            for v in values.iter_mut() {
                *v = if v.is_finite() { *v / max } else { 0.0 };
            }
            log::debug!("Normalized features by {:.6}", max);
            Some(max)
        }
        _ => {
            values.fill(0.0);
            None
        }
    }
}
