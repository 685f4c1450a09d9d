//! Offline DSP building blocks: biquad filters, STFT, median filtering.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Q values for a 4th-order Butterworth response split into two
/// second-order sections.
const BUTTERWORTH_Q: [f32; 2] = [0.54119610, 1.3065630];

/// Second-order IIR section, transposed direct form II.
#[derive(Clone, Copy, Debug)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    fn from_coeffs(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Low-pass section. `cutoff` is a fraction of the Nyquist frequency,
    /// exclusive of 0 and 1.
    pub fn lowpass(cutoff: f32, q: f32) -> Self {
        let w0 = std::f32::consts::PI * cutoff;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q);
        let b1 = 1.0 - cos;
        let b0 = b1 / 2.0;
        Self::from_coeffs(b0, b1, b0, 1.0 + alpha, -2.0 * cos, 1.0 - alpha)
    }

    /// High-pass section. Same cutoff convention as `lowpass`.
    pub fn highpass(cutoff: f32, q: f32) -> Self {
        let w0 = std::f32::consts::PI * cutoff;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q);
        let b1 = -(1.0 + cos);
        let b0 = -b1 / 2.0;
        Self::from_coeffs(b0, b1, b0, 1.0 + alpha, -2.0 * cos, 1.0 - alpha)
    }

    pub fn tick(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    pub fn run(&mut self, samples: &mut [f32]) {
        for s in samples {
            *s = self.tick(*s);
        }
    }
}

/// 4th-order Butterworth band-pass as a cascade: two high-pass sections at
/// the low edge, two low-pass sections at the high edge. Edges are fractions
/// of Nyquist and must satisfy `0 < low < high < 1`.
pub fn butterworth_bandpass(low: f32, high: f32) -> [Biquad; 4] {
    [
        Biquad::highpass(low, BUTTERWORTH_Q[0]),
        Biquad::highpass(low, BUTTERWORTH_Q[1]),
        Biquad::lowpass(high, BUTTERWORTH_Q[0]),
        Biquad::lowpass(high, BUTTERWORTH_Q[1]),
    ]
}

pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let x = std::f32::consts::TAU * i as f32 / size as f32;
            0.5 * (1.0 - x.cos())
        })
        .collect()
}

/// Short-time Fourier transform returning magnitude frames.
pub struct Stft {
    size: usize,
    hop: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl Stft {
    pub fn new(size: usize, hop: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            size,
            hop,
            window: hann_window(size),
            fft: planner.plan_fft_forward(size),
        }
    }

    pub fn frame_count(&self, samples: usize) -> usize {
        if samples < self.size {
            1
        } else {
            (samples - self.size) / self.hop + 1
        }
    }

    /// Magnitude spectrogram, `frame_count` frames of `size / 2 + 1` bins.
    /// Input shorter than one frame is zero-padded.
    pub fn magnitudes(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        let frames = self.frame_count(samples.len());
        let bins = self.size / 2 + 1;
        let mut buf = vec![Complex::new(0.0, 0.0); self.size];
        let mut out = Vec::with_capacity(frames);

        for f in 0..frames {
            let start = f * self.hop;
            for (i, c) in buf.iter_mut().enumerate() {
                let s = samples.get(start + i).copied().unwrap_or(0.0);
                *c = Complex::new(s * self.window[i], 0.0);
            }
            self.fft.process(&mut buf);
            out.push(buf[..bins].iter().map(|c| c.norm()).collect());
        }
        out
    }
}

/// Sliding median with a centered window of `2 * half + 1` elements,
/// truncated at the edges.
pub fn median_filter(data: &[f32], half: usize) -> Vec<f32> {
    let mut scratch = Vec::with_capacity(2 * half + 1);
    (0..data.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(data.len());
            scratch.clear();
            scratch.extend_from_slice(&data[lo..hi]);
            scratch.sort_unstable_by(f32::total_cmp);
            scratch[scratch.len() / 2]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (std::f32::consts::TAU * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut bq = Biquad::lowpass(0.1, 0.707);
        let mut y = 0.0;
        for _ in 0..2000 {
            y = bq.tick(1.0);
        }
        assert!((y - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut bq = Biquad::highpass(0.1, 0.707);
        let mut y = 1.0;
        for _ in 0..2000 {
            y = bq.tick(1.0);
        }
        assert!(y.abs() < 1e-3);
    }

    #[test]
    fn test_bandpass_selectivity() {
        let sr = 22050.0;
        // edges 80..160 Hz as fractions of nyquist
        let (low, high) = (80.0 / (sr / 2.0), 160.0 / (sr / 2.0));

        let mut in_band = sine(110.0, sr, 22050);
        for stage in butterworth_bandpass(low, high).iter_mut() {
            stage.run(&mut in_band);
        }
        let mut out_of_band = sine(4000.0, sr, 22050);
        for stage in butterworth_bandpass(low, high).iter_mut() {
            stage.run(&mut out_of_band);
        }

        // skip filter warmup
        assert!(rms(&in_band[4410..]) > 0.4);
        assert!(rms(&out_of_band[4410..]) < 0.01);
    }

    #[test]
    fn test_hann_window() {
        let w = hann_window(8);
        assert_eq!(w[0], 0.0);
        assert!((w[4] - 1.0).abs() < 1e-6);
        assert!((w[1] - w[7]).abs() < 1e-6);
    }

    #[test]
    fn test_stft_frame_count() {
        let stft = Stft::new(2048, 512);
        assert_eq!(stft.frame_count(2048), 1);
        assert_eq!(stft.frame_count(2048 + 512), 2);
        assert_eq!(stft.frame_count(100), 1);
    }

    #[test]
    fn test_stft_peak_bin() {
        let sr = 22050.0;
        let stft = Stft::new(2048, 512);
        let mag = stft.magnitudes(&sine(1000.0, sr, 4096));
        let peak = mag[0]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        let expected = (1000.0 * 2048.0 / sr).round() as usize;
        assert!(peak.abs_diff(expected) <= 1);
    }

    #[test]
    fn test_median_filter() {
        assert_eq!(median_filter(&[1.0, 9.0, 1.0, 1.0], 1), vec![9.0, 1.0, 1.0, 1.0]);
        assert_eq!(median_filter(&[3.0, 1.0, 2.0], 5), vec![2.0, 2.0, 2.0]);
        assert_eq!(median_filter(&[], 2), Vec::<f32>::new());
    }
}
