mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cli::{Cli, InputFormat};
use speechcmd::audio::payload::{samples_from_bytes, RecognizeRequest};
use speechcmd::audio::{decode, AudioData};
use speechcmd::classifier::{self, model};
use speechcmd::config;
use speechcmd::scores::{Mode, Recognition};
use speechcmd::{PipelineError, Recognizer, DEFAULT_THRESHOLD};

/// Where one payload comes from.
enum Source {
    Stdin,
    File(PathBuf),
}

impl Source {
    fn name(&self) -> String {
        match self {
            Source::Stdin => "<stdin>".into(),
            Source::File(path) => path.display().to_string(),
        }
    }
}

struct Settings {
    format: InputFormat,
    mode: Mode,
    threshold: f32,
    timeout: Option<Duration>,
    resample: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect speechcmd.toml / user config
    let config_path = cli.config.clone().or_else(config::find_config);
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.mode == Mode::Filter { cli.mode = cfg.recognition.mode; }
            if cli.threshold == DEFAULT_THRESHOLD { cli.threshold = cfg.recognition.threshold; }
            if cli.timeout == 10.0 { cli.timeout = cfg.recognition.timeout_secs; }
            if !cli.no_resample { cli.no_resample = !cfg.audio.resample; }
            if cli.model.is_none() {
                cli.model = cfg.model.path;
            }
            if cli.metadata.is_none() {
                cli.metadata = cfg.model.metadata;
            }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let model_arg = cli
        .model
        .as_deref()
        .context("No model given: pass --model or set [model] path in the config")?;
    let model_path = model::resolve_model_path(model_arg)?;
    let metadata_path = match cli.metadata.clone() {
        Some(path) => Some(path),
        None if model::is_url(model_arg) => model::resolve_metadata_for_url(model_arg, &model_path)?,
        None => None,
    };

    let classifier = classifier::load(&model_path, metadata_path.as_deref())
        .context("Failed to load classifier")?;
    let recognizer = Recognizer::new(classifier);

    let meta = recognizer.metadata();
    log::info!(
        "Model ready: {}Hz, fft {}, input {:?}, {} labels",
        meta.sample_rate_hz,
        meta.fft_size,
        meta.input_shape.dims(),
        meta.labels.len()
    );

    if cli.show_model {
        println!("{}", serde_json::to_string_pretty(meta)?);
        return Ok(());
    }

    let sources: Vec<Source> = if cli.stdin {
        if !cli.inputs.is_empty() {
            anyhow::bail!("--stdin cannot be combined with input files");
        }
        vec![Source::Stdin]
    } else {
        cli.inputs.iter().cloned().map(Source::File).collect()
    };
    if sources.is_empty() {
        anyhow::bail!("No input given: pass payload files or --stdin");
    }

    let settings = Settings {
        format: cli.format,
        mode: cli.mode,
        threshold: cli.threshold,
        timeout: request_timeout(cli.timeout)?,
        resample: !cli.no_resample,
    };

    let pb = if sources.len() > 1 {
        let pb = ProgressBar::new(sources.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} inputs")
                .context("Invalid progress bar template")?
                .progress_chars("=>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    // Independent requests sharing one classifier handle
    let results: Vec<Result<Recognition, PipelineError>> = sources
        .par_iter()
        .map(|source| {
            let result = recognize_source(&recognizer, source, &settings);
            pb.inc(1);
            result
        })
        .collect();
    pb.finish_and_clear();

    let mut failures = 0;
    for (source, result) in sources.iter().zip(results) {
        let line = match result {
            Ok(recognition) => {
                log::info!("{}: {}", source.name(), summarize(&recognition));
                serde_json::to_string(&recognition)?
            }
            Err(err) => {
                failures += 1;
                log::error!("{}: {}", source.name(), err);
                serde_json::json!({ "error": err.to_string() }).to_string()
            }
        };
        println!("{}", line);
    }

    if failures > 0 {
        anyhow::bail!("{} of {} inputs failed", failures, sources.len());
    }
    Ok(())
}

/// Per-request deadline from seconds; zero disables it.
fn request_timeout(secs: f32) -> Result<Option<Duration>> {
    if secs == 0.0 {
        return Ok(None);
    }
    match Duration::try_from_secs_f32(secs) {
        Ok(timeout) => Ok(Some(timeout)),
        Err(err) => anyhow::bail!("Invalid timeout {}s: {}", secs, err),
    }
}

fn recognize_source(
    recognizer: &Recognizer,
    source: &Source,
    settings: &Settings,
) -> Result<Recognition, PipelineError> {
    let mut audio = load_audio(source, settings.format)?;

    if settings.format == InputFormat::Audio {
        let target = recognizer.metadata().sample_rate_hz;
        if settings.resample {
            audio = decode::conform_rate(audio, target)?;
        } else if audio.sample_rate.is_some_and(|sr| sr != target) {
            log::warn!(
                "{}: {}Hz audio fed to a {}Hz model without resampling",
                source.name(),
                audio.sample_rate.unwrap_or_default(),
                target
            );
        }
    }

    match settings.timeout {
        Some(timeout) => {
            recognizer.recognize_within(audio.samples, settings.mode, settings.threshold, timeout)
        }
        None => recognizer.recognize(&audio.samples, settings.mode, settings.threshold),
    }
}

fn load_audio(source: &Source, format: InputFormat) -> Result<AudioData, PipelineError> {
    if let (InputFormat::Audio, Source::File(path)) = (format, source) {
        return decode::decode_audio(path);
    }

    let bytes = match source {
        Source::Stdin => read_stdin()?,
        Source::File(path) => read_file(path)?,
    };

    match format {
        InputFormat::Raw => samples_from_bytes(&bytes).map(AudioData::from_samples),
        InputFormat::Json => RecognizeRequest::from_json(&bytes)?.samples(),
        InputFormat::Audio => decode::decode_audio_bytes(bytes),
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, PipelineError> {
    std::fs::read(path)
        .map_err(|e| PipelineError::Decoding(format!("cannot read {}: {}", path.display(), e)))
}

fn read_stdin() -> Result<Vec<u8>, PipelineError> {
    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .map_err(|e| PipelineError::Decoding(format!("cannot read stdin: {}", e)))?;
    Ok(bytes)
}

fn summarize(recognition: &Recognition) -> String {
    match recognition {
        Recognition::Top { words } => format!("{} ({:.3})", words.word, words.score),
        Recognition::Filtered { word } if word.is_empty() => "no label above threshold".into(),
        Recognition::Filtered { word } => word
            .iter()
            .map(|s| format!("{} ({:.3})", s.word, s.score))
            .collect::<Vec<_>>()
            .join(", "),
    }
}
