use std::sync::{Arc, Mutex};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use speechcmd::audio::payload::{samples_from_bytes, RecognizeRequest};
use speechcmd::classifier::SPEECH_COMMANDS_LABELS;
use speechcmd::scores::{Mode, Recognition};
use speechcmd::{Classifier, FeatureTensor, ModelMetadata, PipelineError, Recognizer};

/// Scores each label by how much of the input shape it was handed, so the
/// response doubles as a checksum of what the classifier received.
struct ShapeEcho {
    metadata: ModelMetadata,
    seen: Mutex<Vec<Vec<usize>>>,
}

impl ShapeEcho {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            metadata: ModelMetadata::speech_commands(),
            seen: Mutex::new(Vec::new()),
        })
    }
}

impl Classifier for ShapeEcho {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn classify(&self, input: &FeatureTensor) -> Result<Vec<f32>, PipelineError> {
        let shape = input.shape().to_vec();
        self.seen.lock().unwrap().push(shape.clone());

        let mut scores = vec![0.0f32; SPEECH_COMMANDS_LABELS.len()];
        // Dims [1, 43, 232, 1] land on the first four labels, scaled into [0, 1].
        for (i, dim) in shape.iter().enumerate() {
            scores[i] = *dim as f32 / 1000.0;
        }
        scores[19] = input.len() as f32 / 10_000.0;
        Ok(scores)
    }
}

fn sine_bytes(len: usize, freq_hz: f32) -> Vec<u8> {
    (0..len)
        .map(|n| (2.0 * std::f32::consts::PI * freq_hz * n as f32 / 44_100.0).sin())
        .flat_map(|s: f32| s.to_ne_bytes())
        .collect()
}

#[test]
fn raw_upload_reaches_classifier_with_fixed_shape() {
    let echo = ShapeEcho::new();
    let recognizer = Recognizer::new(echo.clone());

    let samples = samples_from_bytes(&sine_bytes(2048, 1000.0)).unwrap();
    let result = recognizer.recognize(&samples, Mode::Filter, 0.05).unwrap();

    assert_eq!(*echo.seen.lock().unwrap(), vec![vec![1, 43, 232, 1]]);
    match result {
        Recognition::Filtered { word } => {
            let names: Vec<&str> = word.iter().map(|s| s.word.as_str()).collect();
            // 0.232 for the frequency axis and 0.9976 for the element count.
            assert_eq!(names, vec!["down", "zero"]);
            assert!((word[1].score - 0.9976).abs() < 1e-6);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn base64_request_matches_raw_upload() {
    let bytes = sine_bytes(3000, 440.0);
    let body = format!(r#"{{"audioData":"{}"}}"#, STANDARD.encode(&bytes));

    let recognizer = Recognizer::new(ShapeEcho::new());
    let from_json = RecognizeRequest::from_json(body.as_bytes())
        .and_then(|r| r.samples())
        .unwrap();
    let from_raw = samples_from_bytes(&bytes).unwrap();

    assert_eq!(from_json.samples, from_raw);
    assert_eq!(
        recognizer.features(&from_json.samples).unwrap(),
        recognizer.features(&from_raw).unwrap()
    );

    let top = recognizer.recognize(&from_json.samples, Mode::Top1, 0.05).unwrap();
    assert_eq!(
        serde_json::to_value(&top).unwrap(),
        serde_json::json!({ "words": { "word": "zero", "score": 0.9976f32 } })
    );
}

#[test]
fn long_recording_is_truncated_not_rejected() {
    let recognizer = Recognizer::new(ShapeEcho::new());
    // 44 100 samples -> 312 frames -> 79 872 values, far beyond 9976.
    let samples = samples_from_bytes(&sine_bytes(44_100, 220.0)).unwrap();
    let tensor = recognizer.features(&samples).unwrap();
    assert_eq!(tensor.shape(), &[1, 43, 232, 1]);
    assert!(tensor.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
}

#[test]
fn misaligned_upload_is_a_decoding_error() {
    let mut bytes = sine_bytes(512, 440.0);
    bytes.pop();
    assert!(matches!(
        samples_from_bytes(&bytes),
        Err(PipelineError::Decoding(_))
    ));
}
