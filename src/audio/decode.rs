use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::AudioData;
use crate::error::PipelineError;

fn decoding(what: &str, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::Decoding(format!("{what}: {err}"))
}

/// Decode an audio container (WAV, FLAC, MP3, OGG) into mono samples.
pub fn decode_audio(path: &Path) -> Result<AudioData, PipelineError> {
    let file = std::fs::File::open(path)
        .map_err(|e| decoding(&format!("failed to open {}", path.display()), e))?;

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let audio = decode_source(Box::new(file), hint)?;
    log::info!(
        "Decoded {}: {} samples, {}Hz",
        path.display(),
        audio.len(),
        audio.sample_rate.unwrap_or_default()
    );
    Ok(audio)
}

/// Decode an in-memory audio container, e.g. one piped on stdin.
pub fn decode_audio_bytes(bytes: Vec<u8>) -> Result<AudioData, PipelineError> {
    decode_source(Box::new(std::io::Cursor::new(bytes)), Hint::new())
}

fn decode_source(source: Box<dyn MediaSource>, hint: Hint) -> Result<AudioData, PipelineError> {
    let mss = MediaSourceStream::new(source, Default::default());

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decoding("failed to probe audio format", e))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| PipelineError::Decoding("no audio tracks found".into()))?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| PipelineError::Decoding("unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decoding("failed to create audio decoder", e))?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(decoding("failed to read packet", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(decoding("failed to decode packet", e)),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        let samples = sample_buf.samples();

        // Downmix to mono
        if channels == 1 {
            all_samples.extend_from_slice(samples);
        } else {
            for frame_samples in samples.chunks(channels) {
                let mono: f32 = frame_samples.iter().sum::<f32>() / channels as f32;
                all_samples.push(mono);
            }
        }
    }

    log::debug!(
        "Decoded {} samples at {}Hz ({} channels)",
        all_samples.len(),
        sample_rate,
        channels
    );

    Ok(AudioData {
        samples: all_samples,
        sample_rate: Some(sample_rate),
    })
}

/// Resample mono audio from `from_rate` to `to_rate` using rubato.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, PipelineError> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
        WindowFunction,
    };

    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(
        ratio,
        2.0, // max relative ratio
        params,
        samples.len(),
        1, // mono
    )
    .map_err(|e| decoding("failed to create resampler", e))?;

    let input = vec![samples.to_vec()];
    let output = resampler
        .process(&input, None)
        .map_err(|e| decoding("resampling failed", e))?;

    Ok(output.into_iter().next().unwrap_or_default())
}

/// Bring decoded audio to the model's rate. Raw payloads have no rate and pass through.
pub fn conform_rate(audio: AudioData, target_rate: u32) -> Result<AudioData, PipelineError> {
    match audio.sample_rate {
        Some(rate) if rate != target_rate => {
            log::debug!("Resampling {}Hz -> {}Hz", rate, target_rate);
            let samples = resample(&audio.samples, rate, target_rate)?;
            Ok(AudioData {
                samples,
                sample_rate: Some(target_rate),
            })
        }
        _ => Ok(audio),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Minimal 16-bit PCM mono WAV writer for decoder tests.
    fn write_wav(file: &mut impl Write, samples: &[i16], sample_rate: u32) {
        let data_len = (samples.len() * 2) as u32;
        file.write_all(b"RIFF").unwrap();
        file.write_all(&(36 + data_len).to_le_bytes()).unwrap();
        file.write_all(b"WAVEfmt ").unwrap();
        file.write_all(&16u32.to_le_bytes()).unwrap();
        file.write_all(&1u16.to_le_bytes()).unwrap(); // PCM
        file.write_all(&1u16.to_le_bytes()).unwrap(); // mono
        file.write_all(&sample_rate.to_le_bytes()).unwrap();
        file.write_all(&(sample_rate * 2).to_le_bytes()).unwrap();
        file.write_all(&2u16.to_le_bytes()).unwrap();
        file.write_all(&16u16.to_le_bytes()).unwrap();
        file.write_all(b"data").unwrap();
        file.write_all(&data_len.to_le_bytes()).unwrap();
        for s in samples {
            file.write_all(&s.to_le_bytes()).unwrap();
        }
    }

    #[test]
    fn decodes_pcm_wav() {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        let samples: Vec<i16> = (0..1000).map(|i| ((i % 50) * 100) as i16).collect();
        write_wav(&mut file, &samples, 16000);
        file.flush().unwrap();

        let audio = decode_audio(file.path()).unwrap();
        assert_eq!(audio.sample_rate, Some(16000));
        assert_eq!(audio.len(), 1000);
        assert!(audio.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn decodes_wav_from_memory() {
        let mut bytes = Vec::new();
        write_wav(&mut bytes, &[0, 1000, -1000, 0].repeat(100), 8000);
        let audio = decode_audio_bytes(bytes).unwrap();
        assert_eq!(audio.sample_rate, Some(8000));
        assert_eq!(audio.len(), 400);
    }

    #[test]
    fn garbage_bytes_are_decoding_error() {
        let err = decode_audio_bytes(vec![7u8; 64]).unwrap_err();
        assert!(matches!(err, PipelineError::Decoding(_)));
    }

    #[test]
    fn missing_file_is_decoding_error() {
        let err = decode_audio(Path::new("/nonexistent/clip.wav")).unwrap_err();
        assert!(matches!(err, PipelineError::Decoding(_)));
    }

    #[test]
    fn resample_changes_length_by_ratio() {
        let samples: Vec<f32> = (0..4410).map(|i| (i as f32 * 0.05).sin()).collect();
        let out = resample(&samples, 44100, 16000).unwrap();
        let expected = 4410.0 * 16000.0 / 44100.0;
        assert!((out.len() as f32 - expected).abs() < expected * 0.1);
    }

    #[test]
    fn conform_rate_passes_raw_audio_through() {
        let audio = AudioData::from_samples(vec![0.1; 300]);
        let out = conform_rate(audio, 44100).unwrap();
        assert_eq!(out.len(), 300);
        assert!(out.sample_rate.is_none());
    }
}
