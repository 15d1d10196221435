//! MP3 and FLAC decoding. Multi-channel streams are overlaid: channels are
//! summed and the sum saturates at the sample width's integer range.

use crate::types::AudioBuffer;
#[cfg(any(feature = "mp3", feature = "flac"))]
use std::path::Path;

/// Mix interleaved integer samples down to one channel.
#[cfg_attr(not(any(feature = "mp3", feature = "flac")), allow(dead_code))]
pub(crate) fn overlay(interleaved: &[i32], channels: usize, sample_width: u16) -> Vec<f64> {
    let channels = channels.max(1);
    let max = (1i64 << (sample_width - 1)) - 1;
    let min = -(1i64 << (sample_width - 1));
    interleaved
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i64 = frame.iter().map(|&s| s as i64).sum();
            sum.clamp(min, max) as f64
        })
        .collect()
}

#[cfg_attr(not(any(feature = "mp3", feature = "flac")), allow(dead_code))]
fn mono_buffer(
    interleaved: &[i32],
    channels: usize,
    sample_rate: u32,
    sample_width: u16,
) -> Result<AudioBuffer, String> {
    if sample_width == 0 || sample_width > 32 {
        return Err(format!("unsupported sample width: {sample_width} bits"));
    }
    let signal = overlay(interleaved, channels, sample_width);
    if signal.is_empty() {
        return Err("no samples decoded".into());
    }
    Ok(AudioBuffer {
        signal,
        sample_rate,
        sample_width,
        channels: 1,
        is_float: false,
    })
}

#[cfg(feature = "flac")]
pub fn read_flac(path: &Path) -> Result<AudioBuffer, String> {
    let mut reader = claxon::FlacReader::open(path).map_err(|e| e.to_string())?;
    let info = reader.streaminfo();

    let samples: Vec<i32> = reader
        .samples()
        .collect::<Result<_, _>>()
        .map_err(|e| e.to_string())?;

    mono_buffer(
        &samples,
        info.channels as usize,
        info.sample_rate,
        info.bits_per_sample as u16,
    )
}

/// Decode an MP3 to 16-bit samples. Corrupt packets are skipped.
#[cfg(feature = "mp3")]
pub fn read_mp3(path: &Path) -> Result<AudioBuffer, String> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::errors::Error;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| e.to_string())?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| "no default track".to_string())?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| e.to_string())?;

    let mut interleaved: Vec<i32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(Error::ResetRequired) => break,
            Err(e) => return Err(e.to_string()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate.get_or_insert(spec.rate);
                channels.get_or_insert(spec.channels.count());
                let mut buf = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                interleaved.extend(buf.samples().iter().map(|&s| s as i32));
            }
            Err(Error::DecodeError(_)) | Err(Error::IoError(_)) => continue,
            Err(e) => return Err(e.to_string()),
        }
    }

    let sample_rate = sample_rate.ok_or_else(|| "unknown sample rate".to_string())?;
    mono_buffer(&interleaved, channels.unwrap_or(1), sample_rate, 16)
}
