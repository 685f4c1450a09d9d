//! Audio playback and the reference clocks the scheduler reads.

use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;

/// Seconds elapsed on some monotonic reference since it started.
pub trait Clock {
    fn now(&self) -> f32;
}

/// Wall clock measured from construction. Fallback when no audio stream is
/// available; assumed to track the audio transport with negligible drift.
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Clock for WallClock {
    fn now(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

/// Clock derived from the number of source frames the output stream has
/// played. Cannot drift from the music it is timing.
#[derive(Clone)]
pub struct TransportClock {
    frames: Arc<AtomicU64>,
    sample_rate: u32,
}

impl Clock for TransportClock {
    fn now(&self) -> f32 {
        self.frames.load(Ordering::Relaxed) as f32 / self.sample_rate as f32
    }
}

/// Owns the cpal output stream playing the loaded song. Dropping it stops
/// playback.
pub struct Transport {
    _stream: cpal::Stream,
}

impl Transport {
    /// Starts playing `samples` (mono, at `sample_rate`) on the default
    /// output device, resampling by linear interpolation. The returned clock
    /// keeps advancing past the end of the material so dependent state can
    /// run out naturally.
    pub fn start(
        samples: Arc<Vec<f32>>,
        sample_rate: u32,
    ) -> Result<(Transport, TransportClock), Box<dyn Error>> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or("could not open audio output device")?;
        let config: StreamConfig = device
            .supported_output_configs()?
            .next()
            .ok_or("could not find audio output config")?
            .with_max_sample_rate()
            .into();

        let channels = config.channels.max(1) as usize;
        let step = sample_rate as f64 / config.sample_rate.0 as f64;
        let frames = Arc::new(AtomicU64::new(0));

        let cb_frames = frames.clone();
        let mut pos = 0.0f64;
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], info: &cpal::OutputCallbackInfo| {
                // frames queued in earlier callbacks become audible after
                // the device's output latency
                let ts = info.timestamp();
                let latency = ts
                    .playback
                    .duration_since(&ts.callback)
                    .map_or(0.0, |d| d.as_secs_f64());
                cb_frames.store(played_frames(pos, latency, sample_rate), Ordering::Relaxed);

                for frame in data.chunks_mut(channels) {
                    let i = pos as usize;
                    let v = if i + 1 < samples.len() {
                        let frac = pos.fract() as f32;
                        samples[i] * (1.0 - frac) + samples[i + 1] * frac
                    } else {
                        0.0
                    };
                    for s in frame.iter_mut() {
                        *s = v;
                    }
                    pos += step;
                }
            },
            move |err| {
                eprintln!("stream error: {}", err);
            },
            None,
        )?;
        stream.play()?;

        let clock = TransportClock { frames, sample_rate };
        Ok((Transport { _stream: stream }, clock))
    }
}

/// Source frames audible when a callback fires: everything queued so far
/// minus the device's output latency.
fn played_frames(queued: f64, latency_secs: f64, sample_rate: u32) -> u64 {
    (queued - latency_secs * sample_rate as f64).max(0.0) as u64
}
