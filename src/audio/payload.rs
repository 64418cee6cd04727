//! Decoding of client upload payloads into amplitude samples.
//!
//! Two transports deliver audio: a raw byte buffer (file upload) and a JSON
//! body whose `audioData` field holds the same bytes base64-encoded. Either
//! way the bytes are native-endian `f32` samples, 4 bytes each.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use super::AudioData;
use crate::error::PipelineError;

const SAMPLE_BYTES: usize = std::mem::size_of::<f32>();

/// JSON body of a recognition request.
#[derive(Debug, Clone, Deserialize)]
pub struct RecognizeRequest {
    #[serde(rename = "audioData")]
    pub audio_data: String,
}

impl RecognizeRequest {
    pub fn from_json(body: &[u8]) -> Result<Self, PipelineError> {
        serde_json::from_slice(body)
            .map_err(|e| PipelineError::Decoding(format!("invalid request body: {e}")))
    }

    pub fn samples(&self) -> Result<AudioData, PipelineError> {
        samples_from_base64(&self.audio_data).map(AudioData::from_samples)
    }
}

/// Reinterpret a byte buffer as native-endian `f32` samples.
pub fn samples_from_bytes(bytes: &[u8]) -> Result<Vec<f32>, PipelineError> {
    if bytes.len() % SAMPLE_BYTES != 0 {
        return Err(PipelineError::Decoding(format!(
            "byte length {} is not a multiple of {}",
            bytes.len(),
            SAMPLE_BYTES
        )));
    }

    // Uploaded buffers carry no alignment guarantee, so read each sample unaligned.
    Ok(bytes
        .chunks_exact(SAMPLE_BYTES)
        .map(bytemuck::pod_read_unaligned::<f32>)
        .collect())
}

/// Decode standard base64 text, then reinterpret the bytes as samples.
pub fn samples_from_base64(text: &str) -> Result<Vec<f32>, PipelineError> {
    let bytes = STANDARD.decode(text.trim())?;
    samples_from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_bytes(samples: &[f32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
    }

    #[test]
    fn reads_native_endian_floats() {
        let samples = [0.0f32, -1.5, 0.25, 3.0e-4];
        let decoded = samples_from_bytes(&to_bytes(&samples)).unwrap();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn reads_from_unaligned_offset() {
        let mut bytes = vec![0u8];
        bytes.extend(to_bytes(&[1.0, 2.0]));
        let decoded = samples_from_bytes(&bytes[1..]).unwrap();
        assert_eq!(decoded, vec![1.0, 2.0]);
    }

    #[test]
    fn rejects_partial_sample() {
        let err = samples_from_bytes(&[0u8; 7]).unwrap_err();
        assert!(matches!(err, PipelineError::Decoding(_)));
    }

    #[test]
    fn empty_buffer_is_empty_audio() {
        assert!(samples_from_bytes(&[]).unwrap().is_empty());
    }

    #[test]
    fn decodes_base64_with_whitespace() {
        let text = format!("  {}\n", STANDARD.encode(to_bytes(&[0.5, -0.5])));
        assert_eq!(samples_from_base64(&text).unwrap(), vec![0.5, -0.5]);
    }

    #[test]
    fn rejects_malformed_base64() {
        let err = samples_from_base64("not base64!!").unwrap_err();
        assert!(matches!(err, PipelineError::Decoding(_)));
    }

    #[test]
    fn parses_request_body() {
        let encoded = STANDARD.encode(to_bytes(&[0.125; 4]));
        let body = format!(r#"{{"audioData":"{encoded}"}}"#);
        let request = RecognizeRequest::from_json(body.as_bytes()).unwrap();
        let audio = request.samples().unwrap();
        assert_eq!(audio.samples, vec![0.125; 4]);
        assert!(audio.sample_rate.is_none());
    }

    #[test]
    fn request_without_audio_field_is_rejected() {
        let err = RecognizeRequest::from_json(br#"{"file":"x"}"#).unwrap_err();
        assert!(matches!(err, PipelineError::Decoding(_)));
    }
}
