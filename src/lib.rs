pub mod audio;
pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod scores;

/// Samples per analysis frame.
pub const FRAME_LENGTH: usize = 256;
/// Distance between consecutive frame starts.
pub const FRAME_STEP: usize = 128;

/// Default confidence cut-off for filter mode.
pub const DEFAULT_THRESHOLD: f32 = 0.05;

pub use classifier::{Classifier, ModelMetadata};
pub use error::PipelineError;
pub use features::shaper::{FeatureTensor, InputShape};
pub use pipeline::Recognizer;
pub use scores::ScoredLabel;
