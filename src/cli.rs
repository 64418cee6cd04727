use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use speechcmd::scores::Mode;

#[derive(Parser, Debug)]
#[command(name = "speechcmd", about = "Recognize spoken command words in recorded audio")]
pub struct Cli {
    /// Input payloads; several are recognized in parallel
    pub inputs: Vec<PathBuf>,

    /// Read a single payload from stdin
    #[arg(long)]
    pub stdin: bool,

    /// How input bytes are encoded
    #[arg(short, long, value_enum, default_value_t = InputFormat::Raw)]
    pub format: InputFormat,

    /// Report every label above the threshold, or only the best one
    #[arg(short, long, value_enum, default_value_t = Mode::Filter)]
    pub mode: Mode,

    /// Minimum score reported in filter mode
    #[arg(short, long, default_value_t = 0.05)]
    pub threshold: f32,

    /// ONNX model file or http(s) URL
    #[arg(long)]
    pub model: Option<String>,

    /// Model metadata.json (defaults to the one beside the model)
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// Per-request deadline in seconds (0 disables)
    #[arg(long, default_value_t = 10.0)]
    pub timeout: f32,

    /// Keep decoded audio at its own sample rate
    #[arg(long)]
    pub no_resample: bool,

    /// Config file (defaults to speechcmd.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print model metadata and exit
    #[arg(long)]
    pub show_model: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Native-endian f32 samples
    Raw,
    /// JSON body with base64 `audioData`
    Json,
    /// Audio container (WAV, FLAC, MP3, OGG)
    Audio,
}
