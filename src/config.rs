use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::scores::Mode;
use crate::DEFAULT_THRESHOLD;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModelConfig {
    /// ONNX model file or http(s) URL.
    pub path: Option<String>,
    /// Overrides the `metadata.json` found beside the model.
    pub metadata: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct RecognitionConfig {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Per-request deadline; 0 disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f32,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    /// Resample decoded audio files to the model's rate.
    #[serde(default = "default_resample")]
    pub resample: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            threshold: default_threshold(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            resample: default_resample(),
        }
    }
}

fn default_threshold() -> f32 { DEFAULT_THRESHOLD }
fn default_timeout_secs() -> f32 { 10.0 }
fn default_resample() -> bool { true }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}

/// `speechcmd.toml` in the working directory, then the user config locations.
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("speechcmd.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("speechcmd").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("speechcmd").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
