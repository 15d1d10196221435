use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeatureError>;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("No loader available for filetype ({mime}) for file: {}", .path.display())]
    UnsupportedFormat { path: PathBuf, mime: &'static str },

    #[error(
        "Cannot decode {} ({mime}): support for this format was not compiled in \
         (rebuild with the `{feature}` feature)",
        .path.display()
    )]
    MissingDependency {
        path: PathBuf,
        mime: &'static str,
        feature: &'static str,
    },

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to decode {} ({mime}): {reason}", .path.display())]
    DecodeFailure {
        path: PathBuf,
        mime: &'static str,
        reason: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeatureError {
    /// True for the variants produced by the decoder adapter. The CLI exits
    /// with a distinct status for these.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            FeatureError::UnsupportedFormat { .. }
                | FeatureError::MissingDependency { .. }
                | FeatureError::FileNotFound(_)
                | FeatureError::DecodeFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_classification() {
        let path = PathBuf::from("clip.mp3");
        assert!(FeatureError::FileNotFound(path.clone()).is_decode_error());
        assert!(FeatureError::UnsupportedFormat {
            path: path.clone(),
            mime: "audio/ogg"
        }
        .is_decode_error());
        assert!(FeatureError::MissingDependency {
            path: path.clone(),
            mime: "audio/mpeg",
            feature: "mp3"
        }
        .is_decode_error());
        assert!(FeatureError::DecodeFailure {
            path,
            mime: "audio/mpeg",
            reason: "bad frame".into()
        }
        .is_decode_error());

        assert!(!FeatureError::InvalidArgument("x".into()).is_decode_error());
        assert!(!FeatureError::InvalidInput("x".into()).is_decode_error());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert!(!FeatureError::from(io).is_decode_error());
    }
}
