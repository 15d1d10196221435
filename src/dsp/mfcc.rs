//! Mel-frequency cepstral coefficients in the usual speech-features layout:
//! pre-emphasis, rectangular framing, power spectrum, triangular mel
//! filterbank, log, orthonormal DCT-II, sinusoidal liftering, and the frame
//! log-energy in place of c0.

use crate::dsp::fft::plan_forward;
use crate::error::{FeatureError, Result};
use crate::types::FeatureMatrix;

pub const DEFAULT_NUM_CEPSTRA: usize = 13;

#[derive(Clone, Debug)]
pub struct MfccConfig {
    pub win_seconds: f64,
    pub step_seconds: f64,
    pub num_cepstra: usize,
    pub num_filters: usize,
    /// FFT length. `None` picks the next power of two that holds a window.
    pub nfft: Option<usize>,
    pub low_freq: f64,
    /// Upper filterbank edge in Hz. `None` = Nyquist.
    pub high_freq: Option<f64>,
    /// 0 disables pre-emphasis.
    pub preemphasis: f64,
    /// 0 disables liftering.
    pub cep_lifter: usize,
    pub append_energy: bool,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            win_seconds: 0.025,
            step_seconds: 0.01,
            num_cepstra: DEFAULT_NUM_CEPSTRA,
            num_filters: 2 * DEFAULT_NUM_CEPSTRA,
            nfft: None,
            low_freq: 0.0,
            high_freq: None,
            preemphasis: 0.97,
            cep_lifter: 22,
            append_energy: true,
        }
    }
}

pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

fn round_half_up(x: f64) -> usize {
    (x + 0.5).floor().max(0.0) as usize
}

/// Smallest power of two that is at least one window long.
pub fn default_nfft(sample_rate: u32, win_seconds: f64) -> usize {
    let window_len = win_seconds * sample_rate as f64;
    let mut nfft = 1usize;
    while (nfft as f64) < window_len {
        nfft *= 2;
    }
    nfft
}

fn preemphasize(signal: &[f64], coeff: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(signal.len());
    if let Some(&first) = signal.first() {
        out.push(first);
    }
    out.extend(signal.windows(2).map(|w| w[1] - coeff * w[0]));
    out
}

/// Zero-padded frames covering the whole signal.
fn frame_signal(signal: &[f64], frame_len: usize, frame_step: usize) -> Vec<Vec<f64>> {
    let num_frames = if signal.len() <= frame_len {
        1
    } else {
        1 + ((signal.len() - frame_len) as f64 / frame_step as f64).ceil() as usize
    };

    (0..num_frames)
        .map(|i| {
            let start = i * frame_step;
            let mut frame = vec![0.0; frame_len];
            if start < signal.len() {
                let end = (start + frame_len).min(signal.len());
                frame[..end - start].copy_from_slice(&signal[start..end]);
            }
            frame
        })
        .collect()
}

/// Triangular filters on the `nfft / 2 + 1` power-spectrum bins.
pub fn mel_filterbank(
    num_filters: usize,
    nfft: usize,
    sample_rate: u32,
    low_freq: f64,
    high_freq: f64,
) -> Vec<Vec<f64>> {
    let n_bins = nfft / 2 + 1;
    let low_mel = hz_to_mel(low_freq);
    let high_mel = hz_to_mel(high_freq);

    let edges: Vec<usize> = (0..num_filters + 2)
        .map(|i| {
            let mel = low_mel + (high_mel - low_mel) * i as f64 / (num_filters + 1) as f64;
            ((nfft + 1) as f64 * mel_to_hz(mel) / sample_rate as f64).floor() as usize
        })
        .collect();

    (0..num_filters)
        .map(|j| {
            let (left, center, right) = (edges[j], edges[j + 1], edges[j + 2]);
            let mut filter = vec![0.0; n_bins];
            for i in left..center.min(n_bins) {
                filter[i] = (i - left) as f64 / (center - left) as f64;
            }
            for i in center..right.min(n_bins) {
                filter[i] = (right - i) as f64 / (right - center) as f64;
            }
            filter
        })
        .collect()
}

/// Orthonormal DCT-II.
fn dct_ii(input: &[f64]) -> Vec<f64> {
    let n = input.len();
    let norm0 = (1.0 / n as f64).sqrt();
    let norm = (2.0 / n as f64).sqrt();
    (0..n)
        .map(|k| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    x * (std::f64::consts::PI * k as f64 * (2 * i + 1) as f64 / (2 * n) as f64).cos()
                })
                .sum();
            sum * if k == 0 { norm0 } else { norm }
        })
        .collect()
}

fn floored_ln(x: f64) -> f64 {
    if x == 0.0 {
        f64::EPSILON.ln()
    } else {
        x.ln()
    }
}

fn lifter(coeffs: &mut [f64], l: usize) {
    if l == 0 {
        return;
    }
    let half = l as f64 / 2.0;
    for (n, c) in coeffs.iter_mut().enumerate() {
        *c *= 1.0 + half * (std::f64::consts::PI * n as f64 / l as f64).sin();
    }
}

/// Compute MFCCs, shape (time, num_cepstra).
pub fn mfcc(signal: &[f64], sample_rate: u32, config: &MfccConfig) -> Result<FeatureMatrix> {
    if sample_rate == 0 {
        return Err(FeatureError::InvalidInput("sample rate must be positive".into()));
    }
    if config.num_cepstra == 0 || config.num_cepstra > config.num_filters {
        return Err(FeatureError::InvalidInput(format!(
            "cannot keep {} cepstra from {} filters",
            config.num_cepstra, config.num_filters
        )));
    }
    let nyquist = sample_rate as f64 / 2.0;
    let high_freq = config.high_freq.unwrap_or(nyquist);
    if high_freq > nyquist {
        return Err(FeatureError::InvalidInput(format!(
            "high frequency {high_freq} Hz is above Nyquist ({nyquist} Hz)"
        )));
    }
    if high_freq <= config.low_freq || config.low_freq < 0.0 {
        return Err(FeatureError::InvalidInput(format!(
            "invalid filterbank band {}..{high_freq} Hz",
            config.low_freq
        )));
    }

    let frame_len = round_half_up(config.win_seconds * sample_rate as f64);
    let frame_step = round_half_up(config.step_seconds * sample_rate as f64);
    if frame_len == 0 || frame_step == 0 {
        return Err(FeatureError::InvalidInput(format!(
            "sample rate {sample_rate} Hz is too low for MFCC framing"
        )));
    }
    let nfft = config
        .nfft
        .unwrap_or_else(|| default_nfft(sample_rate, config.win_seconds));
    if frame_len > nfft {
        log::warn!("frame length ({frame_len}) is greater than FFT size ({nfft}), frame will be truncated");
    }

    let emphasized = preemphasize(signal, config.preemphasis);
    let frames = frame_signal(&emphasized, frame_len, frame_step);
    let filterbank = mel_filterbank(config.num_filters, nfft, sample_rate, config.low_freq, high_freq);

    let fft = plan_forward(nfft);
    let mut input = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();
    let mut power = vec![0.0; nfft / 2 + 1];

    let mut data = Vec::with_capacity(frames.len() * config.num_cepstra);
    for frame in &frames {
        input.iter_mut().for_each(|x| *x = 0.0);
        let n = frame.len().min(nfft);
        input[..n].copy_from_slice(&frame[..n]);
        fft.process(&mut input, &mut spectrum)
            .map_err(|e| FeatureError::InvalidInput(format!("FFT failed: {e}")))?;
        for (p, c) in power.iter_mut().zip(spectrum.iter()) {
            *p = c.norm_sqr() / nfft as f64;
        }

        let energy: f64 = power.iter().sum();
        let log_energies: Vec<f64> = filterbank
            .iter()
            .map(|filter| {
                let e: f64 = filter.iter().zip(power.iter()).map(|(w, p)| w * p).sum();
                floored_ln(e)
            })
            .collect();

        let mut cepstra = dct_ii(&log_energies);
        cepstra.truncate(config.num_cepstra);
        lifter(&mut cepstra, config.cep_lifter);
        if config.append_energy {
            cepstra[0] = floored_ln(energy);
        }
        data.extend_from_slice(&cepstra);
    }

    Ok(FeatureMatrix::from_vec(frames.len(), config.num_cepstra, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f64, sample_rate: u32, num_samples: usize) -> Vec<f64> {
        (0..num_samples)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (8000.0 * (2.0 * std::f64::consts::PI * freq * t).sin()).round()
            })
            .collect()
    }

    #[test]
    fn test_mel_round_trip() {
        for hz in [0.0, 300.0, 1000.0, 8000.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 1e-6);
        }
        assert!((hz_to_mel(1000.0) - 1000.0).abs() < 1.0);
    }

    #[test]
    fn test_default_nfft() {
        assert_eq!(default_nfft(16000, 0.025), 512);
        assert_eq!(default_nfft(44100, 0.025), 2048);
        assert_eq!(default_nfft(8000, 0.025), 256);
    }

    #[test]
    fn test_frame_count_and_shape() {
        let signal = tone(440.0, 16000, 16000);
        let feats = mfcc(&signal, 16000, &MfccConfig::default()).unwrap();
        // 1 + ceil((16000 - 400) / 160)
        assert_eq!(feats.shape(), (99, 13));
        assert!(feats.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_short_signal_single_frame() {
        let feats = mfcc(&[1.0, 2.0, 3.0], 16000, &MfccConfig::default()).unwrap();
        assert_eq!(feats.shape(), (1, 13));
    }

    #[test]
    fn test_silence_uses_eps_floor() {
        let feats = mfcc(&vec![0.0; 1600], 16000, &MfccConfig::default()).unwrap();
        let eps_log = f64::EPSILON.ln();
        for row in feats.rows() {
            assert!((row[0] - eps_log).abs() < 1e-9);
        }
    }

    #[test]
    fn test_filterbank_triangles() {
        let fb = mel_filterbank(26, 512, 16000, 0.0, 8000.0);
        assert_eq!(fb.len(), 26);
        for filter in &fb {
            assert_eq!(filter.len(), 257);
            let peak = filter.iter().cloned().fold(0.0, f64::max);
            assert!(peak <= 1.0 && peak > 0.0);
        }
    }

    #[test]
    fn test_band_validation() {
        let signal = tone(440.0, 16000, 4000);
        let config = MfccConfig {
            high_freq: Some(9000.0),
            ..Default::default()
        };
        assert!(mfcc(&signal, 16000, &config).is_err());

        let config = MfccConfig {
            low_freq: 4000.0,
            high_freq: Some(3000.0),
            ..Default::default()
        };
        assert!(mfcc(&signal, 16000, &config).is_err());
    }

    #[test]
    fn test_dct_of_constant() {
        let out = dct_ii(&[2.0; 4]);
        assert!((out[0] - 4.0).abs() < 1e-12);
        assert!(out[1..].iter().all(|v| v.abs() < 1e-12));
    }
}
