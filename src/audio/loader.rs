use crate::audio::sniff::{sniff_file, FileKind};
use crate::audio::wav;
use crate::error::{FeatureError, Result};
use crate::types::AudioBuffer;
use log::{Level, Log, Record};
use std::fmt;
use std::path::Path;

/// Decodes WAV/MP3/FLAC files to mono [`AudioBuffer`]s.
///
/// Failures are reported through the logger the loader was built with and
/// then returned to the caller; nothing is retried.
pub struct AudioLoader<'a> {
    logger: &'a dyn Log,
}

impl AudioLoader<'static> {
    /// Loader reporting through the process-wide logger.
    pub fn new() -> Self {
        Self {
            logger: log::logger(),
        }
    }
}

impl Default for AudioLoader<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> AudioLoader<'a> {
    pub fn with_logger(logger: &'a dyn Log) -> Self {
        Self { logger }
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<AudioBuffer> {
        let path = path.as_ref();
        let result = self.decode(path);
        match &result {
            Ok(audio) => self.emit(
                Level::Debug,
                format_args!(
                    "Loaded {}: {} samples at {} Hz, {} bits",
                    path.display(),
                    audio.signal.len(),
                    audio.sample_rate,
                    audio.sample_width
                ),
            ),
            Err(e) => self.report(e),
        }
        result
    }

    fn decode(&self, path: &Path) -> Result<AudioBuffer> {
        // Existence is settled first so a missing decoder is never confused
        // with a missing file.
        if !path.is_file() {
            return Err(FeatureError::FileNotFound(path.to_path_buf()));
        }

        let kind = sniff_file(path)?;
        match kind {
            FileKind::Wav => {
                wav::read_wav(path).map_err(|reason| decode_failure(path, kind, reason))
            }
            FileKind::Mpeg => decode_mpeg(path),
            FileKind::Flac => decode_flac(path),
            FileKind::Ogg | FileKind::Mp4 | FileKind::Unknown => {
                Err(FeatureError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    mime: kind.mime(),
                })
            }
        }
    }

    fn report(&self, error: &FeatureError) {
        match error {
            FeatureError::MissingDependency {
                path,
                mime,
                feature,
            } => self.emit(
                Level::Error,
                format_args!(
                    "Failed to load audio file: {}. Its MIME type is: {}. The most likely \
                     cause is that this build does not include the `{}` decoder. Rebuild \
                     with `--features {}` to enable it.",
                    path.display(),
                    mime,
                    feature,
                    feature
                ),
            ),
            FeatureError::DecodeFailure { path, mime, reason } => self.emit(
                Level::Error,
                format_args!(
                    "Failed to load audio file: {}. Its MIME type is: {}. Cause: {}",
                    path.display(),
                    mime,
                    reason
                ),
            ),
            other => self.emit(Level::Error, format_args!("Failed to load audio file: {other}")),
        }
    }

    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let record = Record::builder()
            .level(level)
            .target(module_path!())
            .module_path_static(Some(module_path!()))
            .file_static(Some(file!()))
            .args(args)
            .build();
        if self.logger.enabled(record.metadata()) {
            self.logger.log(&record);
        }
    }
}

fn decode_failure(path: &Path, kind: FileKind, reason: String) -> FeatureError {
    FeatureError::DecodeFailure {
        path: path.to_path_buf(),
        mime: kind.mime(),
        reason,
    }
}

#[cfg(any(test, not(feature = "mp3"), not(feature = "flac")))]
fn missing_dependency(path: &Path, kind: FileKind, feature: &'static str) -> FeatureError {
    FeatureError::MissingDependency {
        path: path.to_path_buf(),
        mime: kind.mime(),
        feature,
    }
}

fn decode_mpeg(path: &Path) -> Result<AudioBuffer> {
    #[cfg(feature = "mp3")]
    {
        crate::audio::compressed::read_mp3(path)
            .map_err(|reason| decode_failure(path, FileKind::Mpeg, reason))
    }
    #[cfg(not(feature = "mp3"))]
    {
        Err(missing_dependency(path, FileKind::Mpeg, "mp3"))
    }
}

fn decode_flac(path: &Path) -> Result<AudioBuffer> {
    #[cfg(feature = "flac")]
    {
        crate::audio::compressed::read_flac(path)
            .map_err(|reason| decode_failure(path, FileKind::Flac, reason))
    }
    #[cfg(not(feature = "flac"))]
    {
        Err(missing_dependency(path, FileKind::Flac, "flac"))
    }
}
