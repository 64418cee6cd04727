use crate::error::PipelineError;
use crate::{FRAME_LENGTH, FRAME_STEP};

/// Number of full frames that fit in `n` samples. Trailing samples are dropped.
pub fn frame_count(n: usize) -> usize {
    if n < FRAME_LENGTH {
        0
    } else {
        (n - FRAME_LENGTH) / FRAME_STEP + 1
    }
}

/// Slice `samples` into overlapping `FRAME_LENGTH` frames, `FRAME_STEP` apart.
pub fn extract_frames(samples: &[f32]) -> Result<Vec<&[f32]>, PipelineError> {
    if samples.len() < FRAME_LENGTH {
        return Err(PipelineError::InsufficientSamples {
            got: samples.len(),
            need: FRAME_LENGTH,
        });
    }

    let frames: Vec<&[f32]> = (0..frame_count(samples.len()))
        .map(|i| &samples[i * FRAME_STEP..i * FRAME_STEP + FRAME_LENGTH])
        .collect();

    log::debug!("Extracted {} frames from {} samples", frames.len(), samples.len());
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count_matches_formula_for_all_lengths() {
        for n in FRAME_LENGTH..4 * 1024 {
            let samples = vec![0.0f32; n];
            let frames = extract_frames(&samples).unwrap();
            assert_eq!(frames.len(), (n - 256) / 128 + 1, "n = {n}");
            assert!(frames.iter().all(|f| f.len() == FRAME_LENGTH));
        }
    }

    #[test]
    fn frames_overlap_by_half() {
        let samples: Vec<f32> = (0..640).map(|i| i as f32).collect();
        let frames = extract_frames(&samples).unwrap();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0][0], 0.0);
        assert_eq!(frames[1][0], 128.0);
        assert_eq!(frames[3][255], 639.0);
        assert_eq!(frames[0][128..], frames[1][..128]);
    }

    #[test]
    fn trailing_samples_are_dropped() {
        let samples: Vec<f32> = (0..300).map(|i| i as f32).collect();
        let frames = extract_frames(&samples).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(*frames[0].last().unwrap(), 255.0);
    }

    #[test]
    fn short_audio_is_rejected() {
        for n in [0, 1, 255] {
            let err = extract_frames(&vec![0.0; n]).unwrap_err();
            assert!(matches!(
                err,
                PipelineError::InsufficientSamples { got, need: 256 } if got == n
            ));
        }
        assert_eq!(frame_count(255), 0);
    }
}
