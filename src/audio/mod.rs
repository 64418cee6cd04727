pub mod decode;
pub mod payload;

/// Mono amplitude samples handed to the recognizer.
#[derive(Clone, Debug, Default)]
pub struct AudioData {
    pub samples: Vec<f32>,
    /// Recording rate, when the payload carried one. Raw sample buffers don't.
    pub sample_rate: Option<u32>,
}

impl AudioData {
    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self {
            samples,
            sample_rate: None,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
