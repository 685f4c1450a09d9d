//! Onset detection: percussive isolation, strength envelope, peak picking.

use crate::config::Config;
use crate::dsp::{median_filter, Stft};

/// Epsilon guarding the strength normalization denominator.
const NORM_EPSILON: f32 = 1e-6;

/// Time-ordered onset instants with parallel normalized strengths.
#[derive(Clone, Debug, Default)]
pub struct Onsets {
    pub times: Vec<f32>,
    pub strengths: Vec<f32>,
}

/// Detects onsets in one band-limited signal.
pub fn detect(samples: &[f32], sample_rate: u32, config: &Config) -> Onsets {
    let env = envelope(samples, config);
    let peaks = peak_pick(&env, config);
    let times = peaks
        .iter()
        .map(|&f| (f * config.hop) as f32 / sample_rate as f32)
        .collect();
    let raw: Vec<f32> = peaks.iter().map(|&f| env[f]).collect();
    Onsets {
        times,
        strengths: normalize(&raw),
    }
}

/// Onset-strength envelope: STFT, percussive masking, then mean positive
/// log-magnitude flux per frame. The first frame has no predecessor and
/// scores zero. The result is scaled to its peak, so the picking threshold
/// means the same thing at any recording level.
pub fn envelope(samples: &[f32], config: &Config) -> Vec<f32> {
    let stft = Stft::new(config.fft_size, config.hop);
    let mag = stft.magnitudes(samples);
    let perc = percussive(&mag, config.hpss_half_kernel);

    let bins = config.fft_size / 2 + 1;
    let mut env = vec![0.0; perc.len()];
    for t in 1..perc.len() {
        let mut flux = 0.0;
        for b in 0..bins {
            let diff = perc[t][b].ln_1p() - perc[t - 1][b].ln_1p();
            if diff > 0.0 {
                flux += diff;
            }
        }
        env[t] = flux / bins as f32;
    }

    let max = env.iter().copied().fold(0.0, f32::max);
    if max > 0.0 {
        for v in env.iter_mut() {
            *v /= max;
        }
    }
    env
}

/// Harmonic/percussive decomposition by median filtering, keeping only the
/// percussive part. Harmonic energy is smooth across time, percussive energy
/// smooth across frequency; each spectrogram cell is scaled by the soft mask
/// `p^2 / (p^2 + h^2)`.
fn percussive(mag: &[Vec<f32>], half_kernel: usize) -> Vec<Vec<f32>> {
    if mag.is_empty() {
        return Vec::new();
    }
    let frames = mag.len();
    let bins = mag[0].len();

    // median across time per bin
    let mut harmonic = vec![vec![0.0; bins]; frames];
    let mut col = vec![0.0; frames];
    for b in 0..bins {
        for t in 0..frames {
            col[t] = mag[t][b];
        }
        let filtered = median_filter(&col, half_kernel);
        for t in 0..frames {
            harmonic[t][b] = filtered[t];
        }
    }

    // median across frequency per frame, then mask
    let mut out = vec![vec![0.0; bins]; frames];
    for t in 0..frames {
        let perc = median_filter(&mag[t], half_kernel);
        for b in 0..bins {
            let p2 = perc[b] * perc[b];
            let h2 = harmonic[t][b] * harmonic[t][b];
            let denom = p2 + h2;
            if denom > 0.0 {
                out[t][b] = mag[t][b] * p2 / denom;
            }
        }
    }
    out
}

/// Picks local maxima of the envelope. A frame is an onset when it is the
/// maximum within `peak_max_window` frames on either side, exceeds the mean
/// over `peak_avg_window` frames on either side by `sensitivity`, and is more
/// than `peak_wait` frames past the previous onset.
pub fn peak_pick(env: &[f32], config: &Config) -> Vec<usize> {
    let mut peaks = Vec::new();
    let mut last: Option<usize> = None;

    for i in 0..env.len() {
        let lo = i.saturating_sub(config.peak_max_window);
        let hi = (i + config.peak_max_window + 1).min(env.len());
        if env[lo..hi].iter().any(|&v| v > env[i]) {
            continue;
        }

        let lo = i.saturating_sub(config.peak_avg_window);
        let hi = (i + config.peak_avg_window + 1).min(env.len());
        let mean = env[lo..hi].iter().sum::<f32>() / (hi - lo) as f32;
        if env[i] < mean + config.sensitivity {
            continue;
        }

        if let Some(last) = last {
            if i - last <= config.peak_wait {
                continue;
            }
        }
        peaks.push(i);
        last = Some(i);
    }
    peaks
}

/// Min-max normalization to [0, 1] across one track. An all-equal input maps
/// to 0.0 rather than dividing by zero; an empty input stays empty.
pub fn normalize(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let min = raw.iter().copied().fold(f32::INFINITY, f32::min);
    let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    raw.iter().map(|v| (v - min) / (range + NORM_EPSILON)).collect()
}
