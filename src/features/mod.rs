//! Audio samples to classifier input: framing, spectral analysis, shaping.

pub mod frames;
pub mod shaper;
pub mod spectrum;

/// Stack of per-frame magnitude spectra, row-major (frame, then bin).
#[derive(Clone, Debug, Default)]
pub struct Spectrogram {
    pub values: Vec<f32>,
    pub num_frames: usize,
    pub num_bins: usize,
}

impl Spectrogram {
    /// Logical `[num_frames, num_bins, 1]` shape.
    pub fn shape(&self) -> [usize; 3] {
        [self.num_frames, self.num_bins, 1]
    }

    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.num_bins)?;
        self.values.get(start..start + self.num_bins)
    }
}
