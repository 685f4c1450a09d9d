//! Analysis and game tunables, stored as a TOML file next to the executable.

use std::error::Error;
use std::path::Path;

use serde::{Deserialize, Serialize};

const CONFIG_PATH: &str = "config.toml";

/// One instrument class and its frequency band.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Band {
    pub class: String,
    pub low_hz: f32,
    pub high_hz: f32,
}

impl Band {
    fn new(class: &str, low_hz: f32, high_hz: f32) -> Self {
        Self { class: class.to_owned(), low_hz, high_hz }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Config {
    /// Peak-picking threshold over the local envelope mean. Higher means
    /// fewer, more confident detections.
    pub sensitivity: f32,
    /// STFT frame length in samples.
    pub fft_size: usize,
    /// STFT hop in samples.
    pub hop: usize,
    /// Half-width of the harmonic/percussive median filters, in frames/bins.
    pub hpss_half_kernel: usize,
    /// A peak must be the maximum within this many frames on either side.
    pub peak_max_window: usize,
    /// A peak must exceed the mean over this many frames on either side.
    pub peak_avg_window: usize,
    /// Minimum frames between consecutive peaks. 0 enforces no spacing.
    pub peak_wait: usize,
    /// Instrument classes and their band edges.
    pub bands: Vec<Band>,
    /// Note travel speed in the play view, pixels per second.
    pub note_speed: f32,
    /// Demucs model used by the generation tool.
    pub demucs_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensitivity: 0.15,
            fft_size: 2048,
            hop: 512,
            hpss_half_kernel: 15,
            peak_max_window: 10,
            peak_avg_window: 30,
            peak_wait: 0,
            bands: vec![
                Band::new("Kick", 30.0, 120.0),
                Band::new("Snare", 120.0, 2500.0),
                Band::new("Tom", 200.0, 1000.0),
                Band::new("Cymbal", 4000.0, 10000.0),
            ],
            note_speed: 200.0,
            demucs_model: "htdemucs".to_owned(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, Box<dyn Error>> {
        Self::load_from(CONFIG_PATH.as_ref())
    }

    /// Written back on first run, so the tunables are discoverable on disk.
    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        self.save_to(CONFIG_PATH.as_ref())
    }

    fn load_from(path: &Path) -> Result<Self, Box<dyn Error>> {
        let s = std::fs::read_to_string(path)?;
        let c = toml::from_str(&s)?;
        Ok(c)
    }

    fn save_to(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let s = toml::to_string(self)?;
        std::fs::write(path, s)?;
        Ok(())
    }

    /// Envelope frames per second.
    pub fn frame_rate(&self, sample_rate: u32) -> f32 {
        sample_rate as f32 / self.hop as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.sensitivity, 0.15);
        assert_eq!(c.bands.len(), 4);
        assert_eq!(c.bands[0], Band::new("Kick", 30.0, 120.0));
        assert_eq!(c.note_speed, 200.0);
    }

    #[test]
    fn test_toml_round_trip() {
        let c = Config::default();
        let s = toml::to_string(&c).unwrap();
        let c2: Config = toml::from_str(&s).unwrap();
        assert_eq!(c.bands, c2.bands);
        assert_eq!(c.fft_size, c2.fft_size);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let c: Config = toml::from_str("sensitivity = 0.3").unwrap();
        assert_eq!(c.sensitivity, 0.3);
        assert_eq!(c.hop, 512);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join("drumline_config.toml");
        let mut c = Config::default();
        c.sensitivity = 0.25;
        c.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.sensitivity, 0.25);
        assert_eq!(loaded.bands, c.bands);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_frame_rate() {
        let c = Config::default();
        assert!((c.frame_rate(22050) - 43.066406).abs() < 1e-3);
    }
}
