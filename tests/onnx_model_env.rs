#![cfg(feature = "onnx")]

use std::path::PathBuf;

use speechcmd::scores::{Mode, Recognition};
use speechcmd::{classifier, Recognizer};

/// Optional integration test against a real exported model.
///
/// Run locally with:
/// `SPEECHCMD_MODEL=/path/to/model.onnx cargo test --features onnx --test onnx_model_env -- --nocapture`
#[test]
fn model_env_smoke() {
    let Some(model) = std::env::var_os("SPEECHCMD_MODEL") else {
        eprintln!("skipping: SPEECHCMD_MODEL is not set");
        return;
    };

    let classifier = classifier::load(&PathBuf::from(model), None).expect("load model");
    let recognizer = Recognizer::new(classifier);
    assert!(!recognizer.metadata().labels.is_empty());

    let silence = vec![0.0f32; 44_100];
    let scores = recognizer.scores(&silence).expect("classify silence");
    assert_eq!(scores.len(), recognizer.metadata().labels.len());

    match recognizer.recognize(&silence, Mode::Top1, 0.05).expect("top-1") {
        Recognition::Top { words } => eprintln!("silence -> {} ({:.3})", words.word, words.score),
        other => panic!("unexpected {other:?}"),
    }
}
