//! WAV decoding and simple waveform reduction.

use std::error::Error;
use std::path::Path;

/// Decoded audio, mixed down to mono.
pub struct Audio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Audio {
    pub fn load_wav(path: impl AsRef<Path>) -> Result<Audio, Box<dyn Error>> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                reader.samples::<f32>().collect::<Result<_, _>>()?
            }
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let samples = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        Ok(Audio {
            samples,
            sample_rate: spec.sample_rate,
        })
    }

    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Reduces the waveform to `columns` (min, max) pairs for display.
    pub fn peaks(&self, columns: usize) -> Vec<(f32, f32)> {
        if columns == 0 || self.samples.is_empty() {
            return Vec::new();
        }
        let chunk = (self.samples.len() / columns).max(1);
        self.samples
            .chunks(chunk)
            .take(columns)
            .map(|c| {
                let min = c.iter().copied().fold(f32::INFINITY, f32::min);
                let max = c.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                (min, max)
            })
            .collect()
    }
}
