use crate::error::{FeatureError, Result};
use serde::Serialize;

/// Decoded mono audio.
///
/// Integer PCM sources keep their original sample values (exactly
/// representable as f64); `is_float` marks sources that were stored as IEEE
/// floats and are already in [-1, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    pub signal: Vec<f64>,
    pub sample_rate: u32,
    /// Bits per sample of the source representation.
    pub sample_width: u16,
    pub channels: u16,
    pub is_float: bool,
}

impl AudioBuffer {
    /// Build a mono integer-PCM buffer, checking the invariants every feature
    /// path relies on.
    pub fn new(signal: Vec<f64>, sample_rate: u32, sample_width: u16) -> Result<Self> {
        let buffer = Self {
            signal,
            sample_rate,
            sample_width,
            channels: 1,
            is_float: false,
        };
        buffer.validate()?;
        Ok(buffer)
    }

    pub fn with_float_samples(mut self) -> Self {
        self.is_float = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.signal.is_empty() {
            return Err(FeatureError::InvalidInput("audio signal is empty".into()));
        }
        if self.sample_rate == 0 {
            return Err(FeatureError::InvalidInput("sample rate must be positive".into()));
        }
        if self.sample_width == 0 {
            return Err(FeatureError::InvalidInput("sample width must be positive".into()));
        }
        if self.channels != 1 {
            return Err(FeatureError::InvalidInput(format!(
                "expected mono audio, got {} channels",
                self.channels
            )));
        }
        Ok(())
    }

    pub fn duration_secs(&self) -> f64 {
        self.signal.len() as f64 / self.sample_rate as f64
    }
}

/// Dense 2-D array stored row-major. Rows are time frames.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    pub(crate) fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), rows * cols, "matrix data does not match shape");
        Self { rows, cols, data }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Result of a feature request.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Features {
    /// The decoded signal, unscaled.
    Raw(Vec<f64>),
    /// (time, coefficient)
    Mfcc(FeatureMatrix),
    /// Log-power values, (time, frequency bin).
    #[serde(rename = "spec")]
    Spectrogram(FeatureMatrix),
}

impl Features {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Features::Raw(signal) => (signal.len(), 1),
            Features::Mfcc(m) | Features::Spectrogram(m) => m.shape(),
        }
    }
}
