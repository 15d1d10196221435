//! Audio loading and feature extraction for machine-learning pipelines.
//!
//! Files (WAV, MP3, FLAC) are decoded to mono and turned into one of three
//! representations: the raw signal, MFCCs, or a log-power spectrogram.

pub mod audio;
pub mod dsp;
pub mod error;
pub mod features;
pub mod types;

pub use audio::AudioLoader;
pub use error::{FeatureError, Result};
pub use features::{
    get_audio_features, AudioInput, FeatureExtractor, FeatureKind, FeatureParams, FeatureRequest,
};
pub use types::{AudioBuffer, FeatureMatrix, Features};
