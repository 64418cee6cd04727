use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::Spectrogram;

/// Windowed full-length DFT magnitudes, one spectrum per frame.
///
/// The FFT plan is built once and shared; `analyze` runs frames in parallel.
#[derive(Clone)]
pub struct SpectralAnalyzer {
    frame_length: usize,
    window: Arc<[f32]>,
    fft: Arc<dyn Fft<f32>>,
}

impl SpectralAnalyzer {
    pub fn new(frame_length: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_length);
        Self {
            frame_length,
            window: hann_window(frame_length).into(),
            fft,
        }
    }

    /// Magnitude spectrum of one frame, `frame_length` bins (mirrored half kept).
    ///
    /// Short frames are zero-padded; samples past `frame_length` are ignored.
    pub fn analyze_frame(&self, frame: &[f32]) -> Vec<f32> {
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.frame_length];
        for ((slot, &s), &w) in buffer.iter_mut().zip(frame).zip(self.window.iter()) {
            *slot = Complex::new(s * w, 0.0);
        }

        self.fft.process(&mut buffer);

        buffer.iter().map(|c| c.norm()).collect()
    }

    /// Analyze every frame, preserving frame order.
    pub fn analyze(&self, frames: &[&[f32]]) -> Spectrogram {
        let spectra: Vec<Vec<f32>> = frames
            .par_iter()
            .map(|frame| self.analyze_frame(frame))
            .collect();

        let mut values = Vec::with_capacity(spectra.len() * self.frame_length);
        for spectrum in &spectra {
            values.extend_from_slice(spectrum);
        }

        log::debug!(
            "Spectrogram: {} frames x {} bins",
            spectra.len(),
            self.frame_length
        );

        Spectrogram {
            values,
            num_frames: spectra.len(),
            num_bins: self.frame_length,
        }
    }
}

/// Periodic Hann window: `0.5 - 0.5 * cos(2*pi*n / size)`.
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos())
        .collect()
}
