use crate::error::{FeatureError, Result};

/// Analysis window length, in seconds.
pub const WINDOW_SECONDS: f64 = 0.020;
/// Step between consecutive windows, in seconds.
pub const STEP_SECONDS: f64 = 0.010;

/// Window and hop lengths in samples for a given sample rate.
pub fn frame_params(sample_rate: u32) -> Result<(usize, usize)> {
    let frame_size = (WINDOW_SECONDS * sample_rate as f64).round() as usize;
    let hop_size = (STEP_SECONDS * sample_rate as f64).round() as usize;
    if frame_size == 0 || hop_size == 0 {
        return Err(FeatureError::InvalidInput(format!(
            "sample rate {sample_rate} Hz is too low for a {WINDOW_SECONDS}s window"
        )));
    }
    Ok((frame_size, hop_size))
}

/// Overlapping, fully populated frames borrowed from a signal.
///
/// Frame `i` is `signal[i * hop_size .. i * hop_size + frame_size]`. Trailing
/// samples that would not complete a hop are dropped rather than padded.
#[derive(Clone, Copy, Debug)]
pub struct Frames<'a> {
    samples: &'a [f64],
    frame_size: usize,
    hop_size: usize,
    num_frames: usize,
}

impl<'a> Frames<'a> {
    pub fn new(signal: &'a [f64], frame_size: usize, hop_size: usize) -> Result<Self> {
        if frame_size == 0 || hop_size == 0 {
            return Err(FeatureError::InvalidInput(
                "frame and hop sizes must be positive".into(),
            ));
        }
        if signal.len() < frame_size {
            return Err(FeatureError::InvalidInput(format!(
                "signal of {} samples is shorter than one {frame_size}-sample frame",
                signal.len()
            )));
        }

        let remove = (signal.len() - frame_size) % hop_size;
        let samples = &signal[..signal.len() - remove];
        let num_frames = (samples.len() - frame_size) / hop_size + 1;

        Ok(Self {
            samples,
            frame_size,
            hop_size,
            num_frames,
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn len(&self) -> usize {
        self.num_frames
    }

    pub fn is_empty(&self) -> bool {
        self.num_frames == 0
    }

    /// The truncated signal the frames are cut from.
    pub fn samples(&self) -> &'a [f64] {
        self.samples
    }

    pub fn frame(&self, i: usize) -> &'a [f64] {
        let pos = i * self.hop_size;
        &self.samples[pos..pos + self.frame_size]
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'a [f64]> + '_ {
        (0..self.num_frames).map(move |i| self.frame(i))
    }
}
