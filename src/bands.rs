//! Per-instrument band splitting of the drum signal.

use crate::config::Band;
use crate::dsp;

/// Normalizes band edges to fractions of Nyquist. The low edge is floored at
/// 0.001 and the high edge capped at 0.999; a collapsed band is repaired by
/// widening the high edge. The result always satisfies `0 < low < high < 1`,
/// whatever the sample rate.
pub fn edges(low_hz: f32, high_hz: f32, sample_rate: u32) -> (f32, f32) {
    let nyquist = sample_rate as f32 / 2.0;
    let low = (low_hz / nyquist).clamp(0.001, 0.997);
    let mut high = (high_hz / nyquist).clamp(0.001, 0.999);
    if high <= low {
        high = low + 0.001;
    }
    (low, high)
}

/// Band-limits `samples` with a 4th-order Butterworth band-pass.
pub fn bandpass(samples: &[f32], sample_rate: u32, low_hz: f32, high_hz: f32) -> Vec<f32> {
    let (low, high) = edges(low_hz, high_hz, sample_rate);
    let mut out = samples.to_vec();
    for stage in dsp::butterworth_bandpass(low, high).iter_mut() {
        stage.run(&mut out);
    }
    out
}

/// One filtered signal per configured instrument class.
pub fn split<'a>(
    samples: &[f32],
    sample_rate: u32,
    bands: &'a [Band],
) -> Vec<(&'a str, Vec<f32>)> {
    bands
        .iter()
        .map(|b| {
            (
                b.class.as_str(),
                bandpass(samples, sample_rate, b.low_hz, b.high_hz),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_edges_pass_through() {
        let (low, high) = edges(30.0, 120.0, 22050);
        assert!((low - 30.0 / 11025.0).abs() < 1e-6);
        assert!((high - 120.0 / 11025.0).abs() < 1e-6);
    }

    #[test]
    fn test_edges_never_degenerate() {
        // every configured band, over a spread of sample rates including ones
        // where the band lies entirely above nyquist
        for sr in [4000, 8000, 22050, 44100, 96000] {
            for band in &Config::default().bands {
                let (low, high) = edges(band.low_hz, band.high_hz, sr);
                assert!(low > 0.0, "{} at {sr}", band.class);
                assert!(low < high, "{} at {sr}", band.class);
                assert!(high < 1.0, "{} at {sr}", band.class);
            }
        }
    }

    #[test]
    fn test_edges_collapsed_band_widened() {
        let (low, high) = edges(5000.0, 5000.0, 22050);
        assert!((high - (low + 0.001)).abs() < 1e-6);
    }

    #[test]
    fn test_split_covers_all_classes() {
        let config = Config::default();
        let samples = vec![0.0; 4096];
        let out = split(&samples, 22050, &config.bands);
        let classes: Vec<&str> = out.iter().map(|(c, _)| *c).collect();
        assert_eq!(classes, vec!["Kick", "Snare", "Tom", "Cymbal"]);
        assert!(out.iter().all(|(_, s)| s.len() == samples.len()));
    }
}
