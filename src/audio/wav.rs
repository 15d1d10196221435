use crate::types::AudioBuffer;
use hound::{SampleFormat, WavReader};
use std::io::Read;
use std::path::Path;

pub fn read_wav(path: &Path) -> Result<AudioBuffer, String> {
    let reader = WavReader::open(path).map_err(|e| e.to_string())?;
    decode_wav(reader)
}

/// Decode a WAV stream to mono.
///
/// Multi-channel frames are averaged. For integer PCM the mean is truncated
/// back to an integer so the buffer keeps the source's sample type.
pub fn decode_wav<R: Read>(reader: WavReader<R>) -> Result<AudioBuffer, String> {
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let (interleaved, is_float): (Vec<f64>, bool) = match spec.sample_format {
        SampleFormat::Float => (
            reader
                .into_samples::<f32>()
                .map(|s| s.map(f64::from))
                .collect::<Result<_, _>>()
                .map_err(|e| e.to_string())?,
            true,
        ),
        SampleFormat::Int => (
            reader
                .into_samples::<i32>()
                .map(|s| s.map(f64::from))
                .collect::<Result<_, _>>()
                .map_err(|e| e.to_string())?,
            false,
        ),
    };

    let signal: Vec<f64> = if channels > 1 {
        interleaved
            .chunks_exact(channels)
            .map(|frame| {
                let mean = frame.iter().sum::<f64>() / channels as f64;
                if is_float {
                    mean
                } else {
                    mean.trunc()
                }
            })
            .collect()
    } else {
        interleaved
    };

    if signal.is_empty() {
        return Err("WAV file contains no samples".into());
    }

    Ok(AudioBuffer {
        signal,
        sample_rate: spec.sample_rate,
        sample_width: spec.bits_per_sample,
        channels: 1,
        is_float,
    })
}
