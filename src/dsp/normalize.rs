use crate::error::{FeatureError, Result};
use crate::types::AudioBuffer;

/// Scale a buffer's signal so the full integer range maps to about [-1, +1].
///
/// Integer PCM is divided by `2^(sample_width - 1)`. Float sources are
/// already in range and are returned as-is.
pub fn scale_signal(audio: &AudioBuffer) -> Result<Vec<f64>> {
    if audio.sample_width == 0 {
        return Err(FeatureError::InvalidInput(
            "sample width must be positive".into(),
        ));
    }
    if audio.is_float {
        return Ok(audio.signal.clone());
    }
    let full_scale = 2f64.powi(audio.sample_width as i32 - 1);
    Ok(audio.signal.iter().map(|&s| s / full_scale).collect())
}
