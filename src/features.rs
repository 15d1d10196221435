use crate::audio::AudioLoader;
use crate::dsp::fft::compute_spectrogram;
use crate::dsp::mfcc::{mfcc, MfccConfig, DEFAULT_NUM_CEPSTRA};
use crate::error::{FeatureError, Result};
use crate::types::{AudioBuffer, Features};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureKind {
    Raw,
    Mfcc,
    Spec,
}

impl FromStr for FeatureKind {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(FeatureKind::Raw),
            "mfcc" => Ok(FeatureKind::Mfcc),
            "spec" => Ok(FeatureKind::Spec),
            other => Err(FeatureError::InvalidArgument(format!(
                "Unsupported feature type: {other}"
            ))),
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeatureKind::Raw => "raw",
            FeatureKind::Mfcc => "mfcc",
            FeatureKind::Spec => "spec",
        })
    }
}

/// Named options accompanying a feature request. Keys a feature kind does
/// not use are ignored; keys outside this set are rejected.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureParams {
    /// Number of MFCC coefficients to keep.
    pub features: Option<usize>,
    /// Low cutoff in Hz.
    pub low_freq: Option<f64>,
    /// High cutoff in Hz.
    pub high_freq: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MfccParams {
    pub num_features: usize,
    pub low_freq: Option<f64>,
    pub high_freq: Option<f64>,
}

impl Default for MfccParams {
    fn default() -> Self {
        Self {
            num_features: DEFAULT_NUM_CEPSTRA,
            low_freq: None,
            high_freq: None,
        }
    }
}

impl MfccParams {
    /// Filterbank settings for this request: twice as many filters as
    /// coefficients. A zero high cutoff means Nyquist.
    pub fn config(&self) -> MfccConfig {
        MfccConfig {
            num_cepstra: self.num_features,
            num_filters: 2 * self.num_features,
            low_freq: self.low_freq.unwrap_or(0.0),
            high_freq: self.high_freq.filter(|&f| f != 0.0),
            ..MfccConfig::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpecParams {
    pub low_freq: Option<f64>,
    pub high_freq: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FeatureRequest {
    Raw,
    Mfcc(MfccParams),
    Spec(SpecParams),
}

fn check_cutoff(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(f) if !f.is_finite() => Err(FeatureError::InvalidArgument(format!(
            "{name} must be a finite frequency, got {f}"
        ))),
        _ => Ok(()),
    }
}

impl FeatureRequest {
    pub fn new(kind: FeatureKind, params: &FeatureParams) -> Result<Self> {
        if kind != FeatureKind::Raw {
            check_cutoff("low_freq", params.low_freq)?;
            check_cutoff("high_freq", params.high_freq)?;
        }
        Ok(match kind {
            FeatureKind::Raw => FeatureRequest::Raw,
            FeatureKind::Mfcc => {
                let num_features = params.features.unwrap_or(DEFAULT_NUM_CEPSTRA);
                if num_features == 0 {
                    return Err(FeatureError::InvalidArgument(
                        "number of MFCC features must be positive".into(),
                    ));
                }
                FeatureRequest::Mfcc(MfccParams {
                    num_features,
                    low_freq: params.low_freq,
                    high_freq: params.high_freq,
                })
            }
            FeatureKind::Spec => FeatureRequest::Spec(SpecParams {
                low_freq: params.low_freq,
                high_freq: params.high_freq,
            }),
        })
    }

    /// Parse a feature type name together with its options.
    pub fn parse(feature_type: &str, params: &FeatureParams) -> Result<Self> {
        Self::new(feature_type.parse()?, params)
    }

    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureRequest::Raw => FeatureKind::Raw,
            FeatureRequest::Mfcc(_) => FeatureKind::Mfcc,
            FeatureRequest::Spec(_) => FeatureKind::Spec,
        }
    }
}

/// Audio to extract features from: a file still to be decoded, or a buffer
/// that has already been loaded.
#[derive(Clone, Debug)]
pub enum AudioInput {
    Path(PathBuf),
    Buffer(AudioBuffer),
}

impl From<PathBuf> for AudioInput {
    fn from(path: PathBuf) -> Self {
        AudioInput::Path(path)
    }
}

impl From<&Path> for AudioInput {
    fn from(path: &Path) -> Self {
        AudioInput::Path(path.to_path_buf())
    }
}

impl From<&str> for AudioInput {
    fn from(path: &str) -> Self {
        AudioInput::Path(PathBuf::from(path))
    }
}

impl From<AudioBuffer> for AudioInput {
    fn from(audio: AudioBuffer) -> Self {
        AudioInput::Buffer(audio)
    }
}

/// Routes feature requests to their computation, decoding files first when
/// given a path.
pub struct FeatureExtractor<'a> {
    loader: AudioLoader<'a>,
}

impl FeatureExtractor<'static> {
    pub fn new() -> Self {
        Self {
            loader: AudioLoader::new(),
        }
    }
}

impl Default for FeatureExtractor<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> FeatureExtractor<'a> {
    pub fn with_loader(loader: AudioLoader<'a>) -> Self {
        Self { loader }
    }

    pub fn extract(&self, input: impl Into<AudioInput>, request: &FeatureRequest) -> Result<Features> {
        let audio = match input.into() {
            AudioInput::Path(path) => self.loader.load(&path)?,
            AudioInput::Buffer(audio) => audio,
        };
        audio.validate()?;

        log::debug!(
            "extracting {} features from {:.2}s of audio",
            request.kind(),
            audio.duration_secs()
        );

        match request {
            FeatureRequest::Raw => Ok(Features::Raw(audio.signal)),
            FeatureRequest::Mfcc(params) => {
                mfcc(&audio.signal, audio.sample_rate, &params.config()).map(Features::Mfcc)
            }
            FeatureRequest::Spec(params) => {
                compute_spectrogram(&audio, params.low_freq, params.high_freq)
                    .map(Features::Spectrogram)
            }
        }
    }
}

/// Decode (if needed) and compute one feature representation.
///
/// `feature_type` is one of `"raw"`, `"mfcc"` or `"spec"`.
pub fn get_audio_features(
    input: impl Into<AudioInput>,
    feature_type: &str,
    params: &FeatureParams,
) -> Result<Features> {
    let request = FeatureRequest::parse(feature_type, params)?;
    FeatureExtractor::new().extract(input, &request)
}
