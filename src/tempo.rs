//! Global tempo estimation from an onset-strength envelope.

pub const DEFAULT_BPM: f32 = 120.0;

const MIN_BPM: f32 = 30.0;
const MAX_BPM: f32 = 300.0;
/// Width (in octaves) of the log-normal prior centered on `DEFAULT_BPM`,
/// used to break ties between a tempo and its multiples.
const PRIOR_OCTAVES: f32 = 1.0;

/// Estimates beats per minute by autocorrelating the envelope over lags in
/// the plausible BPM window, weighted toward `DEFAULT_BPM`. The envelope is
/// the mean-aggregated onset strength of the whole track, so the result is a
/// single global tempo. Returns `DEFAULT_BPM` when the envelope is too short
/// or has no periodic structure.
pub fn estimate(env: &[f32], frame_rate: f32) -> f32 {
    let min_lag = ((60.0 * frame_rate / MAX_BPM).round() as usize).max(1);
    let max_lag = (60.0 * frame_rate / MIN_BPM).round() as usize;
    if env.len() <= min_lag + 1 || min_lag >= max_lag {
        return DEFAULT_BPM;
    }
    let max_lag = max_lag.min(env.len() - 1);

    let mean = env.iter().sum::<f32>() / env.len() as f32;
    let x: Vec<f32> = env.iter().map(|v| v - mean).collect();

    let mut best_lag = 0;
    let mut best_score = 0.0;
    for lag in min_lag..=max_lag {
        let acf = x[..x.len() - lag]
            .iter()
            .zip(&x[lag..])
            .map(|(a, b)| a * b)
            .sum::<f32>()
            / (x.len() - lag) as f32;
        let bpm = 60.0 * frame_rate / lag as f32;
        let octaves = (bpm / DEFAULT_BPM).log2() / PRIOR_OCTAVES;
        let score = acf * (-0.5 * octaves * octaves).exp();
        if score > best_score {
            best_score = score;
            best_lag = lag;
        }
    }
    if best_lag == 0 {
        return DEFAULT_BPM;
    }
    60.0 * frame_rate / best_lag as f32
}
