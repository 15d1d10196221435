use crate::dsp::framing::{frame_params, Frames, WINDOW_SECONDS};
use crate::dsp::normalize::scale_signal;
use crate::error::{FeatureError, Result};
use crate::types::{AudioBuffer, FeatureMatrix};
use realfft::{RealFftPlanner, RealToComplex};
use std::cell::RefCell;
use std::ops::Range;
use std::sync::Arc;

/// Added to every power value before taking the log.
pub const LOG_FLOOR: f64 = 1e-14;

thread_local! {
    static FFT_PLANNER: RefCell<RealFftPlanner<f64>> = RefCell::new(RealFftPlanner::new());
}

pub(crate) fn plan_forward(size: usize) -> Arc<dyn RealToComplex<f64>> {
    FFT_PLANNER.with(|p| p.borrow_mut().plan_fft_forward(size))
}

/// Symmetric Hann window: `0.5 - 0.5 * cos(2πk / (N-1))`.
pub fn hann_window(size: usize) -> Vec<f64> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|k| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * k as f64 / (size - 1) as f64).cos())
        .collect()
}

/// Width of one spectrogram bin in Hz.
pub fn bin_width() -> f64 {
    1.0 / WINDOW_SECONDS
}

/// Bin index a cutoff frequency falls into, clamped to `[0, num_bins]`.
pub fn frequency_bin(freq: f64, num_bins: usize) -> usize {
    let bin = (freq / bin_width() + 0.5).floor();
    bin.clamp(0.0, num_bins as f64) as usize
}

/// Range of bins kept for the given cutoffs. Unset cutoffs leave that edge open.
pub fn crop_range(num_bins: usize, low_freq: Option<f64>, high_freq: Option<f64>) -> Result<Range<usize>> {
    let low = low_freq.map_or(0, |f| frequency_bin(f, num_bins));
    let high = high_freq.map_or(num_bins, |f| frequency_bin(f, num_bins));
    if high <= low {
        return Err(FeatureError::InvalidInput(format!(
            "frequency band {low_freq:?}..{high_freq:?} Hz selects no bins"
        )));
    }
    Ok(low..high)
}

/// One-sided power spectral density of every frame, shape (time, frequency).
///
/// Each frame is Hann-windowed before the FFT. Power is divided by
/// `sum(w²) * sample_rate`, halved for the interior bins which stand in for
/// their mirrored negative frequencies.
pub fn power_spectrum(frames: &Frames<'_>, sample_rate: u32) -> Result<FeatureMatrix> {
    let fft_size = frames.frame_size();
    let n_bins = fft_size / 2 + 1;

    let fft = plan_forward(fft_size);
    let window = hann_window(fft_size);

    let scale = window.iter().map(|w| w * w).sum::<f64>() * sample_rate as f64;
    let edge_scale = scale;
    let inner_scale = scale / 2.0;

    let mut input = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();
    let mut data = Vec::with_capacity(frames.len() * n_bins);

    for frame in frames.iter() {
        for (inp, (&s, &w)) in input.iter_mut().zip(frame.iter().zip(window.iter())) {
            *inp = s * w;
        }
        fft.process(&mut input, &mut spectrum)
            .map_err(|e| FeatureError::InvalidInput(format!("FFT failed: {e}")))?;

        data.extend(spectrum.iter().enumerate().map(|(k, c)| {
            let power = c.norm_sqr();
            if k == 0 || k == n_bins - 1 {
                power / edge_scale
            } else {
                power / inner_scale
            }
        }));
    }

    Ok(FeatureMatrix::from_vec(frames.len(), n_bins, data))
}

/// Log-power spectrogram of framed audio, optionally cropped to a band.
pub fn log_spectrogram(
    frames: &Frames<'_>,
    sample_rate: u32,
    low_freq: Option<f64>,
    high_freq: Option<f64>,
) -> Result<FeatureMatrix> {
    let power = power_spectrum(frames, sample_rate)?;
    let (n_frames, n_bins) = power.shape();

    let band = crop_range(n_bins, low_freq, high_freq)?;

    let width = band.len();
    let mut data = Vec::with_capacity(n_frames * width);
    for row in power.rows() {
        data.extend(row[band.clone()].iter().map(|p| (p + LOG_FLOOR).ln()));
    }

    Ok(FeatureMatrix::from_vec(n_frames, width, data))
}

/// Full spectrogram path: scale, frame, analyze.
pub fn compute_spectrogram(
    audio: &AudioBuffer,
    low_freq: Option<f64>,
    high_freq: Option<f64>,
) -> Result<FeatureMatrix> {
    let signal = scale_signal(audio)?;
    let (frame_size, hop_size) = frame_params(audio.sample_rate)?;
    let frames = Frames::new(&signal, frame_size, hop_size)?;

    log::debug!(
        "spectrogram: {} frames of {} samples (hop {}) at {} Hz",
        frames.len(),
        frame_size,
        hop_size,
        audio.sample_rate
    );

    log_spectrogram(&frames, audio.sample_rate, low_freq, high_freq)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: u32, num_samples: usize, amplitude: f64) -> Vec<f64> {
        (0..num_samples)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                amplitude * (2.0 * std::f64::consts::PI * freq * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_hann_shape() {
        let w = hann_window(320);
        assert_eq!(w[0], 0.0);
        for k in 0..w.len() {
            assert!((w[k] - w[w.len() - 1 - k]).abs() < 1e-12);
        }
        let w = hann_window(5);
        assert!((w[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bin_count_without_cutoffs() {
        let audio = AudioBuffer::new(sine(1000.0, 16000, 16000, 10000.0), 16000, 16).unwrap();
        let spec = compute_spectrogram(&audio, None, None).unwrap();
        assert_eq!(spec.shape().1, 320 / 2 + 1);
        assert_eq!(spec.shape().0, (16000 - 320) / 160 + 1);
    }

    #[test]
    fn test_frequency_bins() {
        assert_eq!(bin_width(), 50.0);
        assert_eq!(frequency_bin(100.0, 161), 2);
        assert_eq!(frequency_bin(2000.0, 161), 40);
        assert_eq!(frequency_bin(-300.0, 161), 0);
        assert_eq!(frequency_bin(1e6, 161), 161);
    }

    #[test]
    fn test_crop() {
        let audio = AudioBuffer::new(sine(1000.0, 16000, 8000, 10000.0), 16000, 16).unwrap();
        let spec = compute_spectrogram(&audio, Some(100.0), Some(2000.0)).unwrap();
        assert_eq!(spec.shape().1, 38);

        let low_only = compute_spectrogram(&audio, Some(100.0), None).unwrap();
        assert_eq!(low_only.shape().1, 161 - 2);

        let full = compute_spectrogram(&audio, None, None).unwrap();
        assert_eq!(low_only.row(3), &full.row(3)[2..]);
    }

    #[test]
    fn test_empty_band_rejected() {
        assert!(crop_range(161, Some(2000.0), Some(100.0)).is_err());
        assert!(crop_range(161, None, Some(0.0)).is_err());
        assert_eq!(crop_range(161, Some(0.0), None).unwrap(), 0..161);
    }

    #[test]
    fn test_power_scales_quadratically() {
        let base = sine(700.0, 16000, 4000, 0.1);
        let louder: Vec<f64> = base.iter().map(|s| s * 3.0).collect();

        let a = Frames::new(&base, 320, 160).unwrap();
        let b = Frames::new(&louder, 320, 160).unwrap();
        let pa = power_spectrum(&a, 16000).unwrap();
        let pb = power_spectrum(&b, 16000).unwrap();

        for (ra, rb) in pa.rows().zip(pb.rows()) {
            let peak = rb.iter().cloned().fold(0.0f64, f64::max);
            for (x, y) in ra.iter().zip(rb) {
                assert!((y - 9.0 * x).abs() <= 1e-9 * peak);
            }
        }
    }

    #[test]
    fn test_cropped_log_power_shifts_by_ln_nine() {
        let base = sine(700.0, 16000, 4000, 0.1);
        let louder: Vec<f64> = base.iter().map(|s| s * 3.0).collect();

        let a = Frames::new(&base, 320, 160).unwrap();
        let b = Frames::new(&louder, 320, 160).unwrap();
        let la = log_spectrogram(&a, 16000, Some(300.0), Some(1500.0)).unwrap();
        let lb = log_spectrogram(&b, 16000, Some(300.0), Some(1500.0)).unwrap();
        assert_eq!(la.shape(), (a.len(), 30 - 6));

        // Well above the floor the additive 1e-14 is negligible.
        let threshold = 1e-6f64.ln();
        let mut checked = 0;
        for (x, y) in la.as_slice().iter().zip(lb.as_slice()) {
            if *x > threshold {
                assert!((y - x - 9f64.ln()).abs() < 1e-6);
                checked += 1;
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_edge_bins_not_doubled() {
        // A DC frame puts nearly all its energy in bin 0; check the two
        // normalizations against a direct computation.
        let signal = vec![0.5; 320];
        let frames = Frames::new(&signal, 320, 160).unwrap();
        let power = power_spectrum(&frames, 16000).unwrap();

        let w = hann_window(320);
        let scale: f64 = w.iter().map(|x| x * x).sum::<f64>() * 16000.0;
        let dc: f64 = w.iter().map(|x| x * 0.5).sum();
        let expected = dc * dc / scale;
        assert!((power.get(0, 0) - expected).abs() < 1e-12 * expected);
    }

    #[test]
    fn test_silence_hits_log_floor() {
        let audio = AudioBuffer::new(vec![0.0; 1600], 16000, 16).unwrap();
        let spec = compute_spectrogram(&audio, None, None).unwrap();
        let floor = LOG_FLOOR.ln();
        assert!(spec.as_slice().iter().all(|&v| (v - floor).abs() < 1e-12));
    }

    #[test]
    fn test_440hz_peak() {
        let sample_rate = 16000;
        let samples: Vec<f64> = sine(440.0, sample_rate, 16000, 1.0)
            .into_iter()
            .map(|s| (s * 32767.0).round())
            .collect();
        let audio = AudioBuffer::new(samples, sample_rate, 16).unwrap();
        let spec = compute_spectrogram(&audio, None, None).unwrap();

        let expected_bin = (440.0f64 / 50.0).round() as usize;
        assert_eq!(expected_bin, 9);
        for row in spec.rows() {
            let peak = row
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .unwrap()
                .0;
            assert_eq!(peak, expected_bin);
        }
    }

    #[test]
    fn test_short_signal_fails() {
        let audio = AudioBuffer::new(vec![1.0; 100], 16000, 16).unwrap();
        assert!(matches!(
            compute_spectrogram(&audio, None, None),
            Err(FeatureError::InvalidInput(_))
        ));
    }
}
