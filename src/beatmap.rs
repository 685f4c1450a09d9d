//! The persisted beatmap schema: one JSON file per song.

use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One rhythmic hit: seconds from track start and normalized intensity.
/// Both fields carry 3-decimal precision in the persisted form.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Event {
    pub time: f64,
    pub strength: f64,
}

/// A full song analysis: tempo, sample rate, and one time-ordered event list
/// per instrument class. Track order is the map's key order, which gives
/// every class a stable lane index at load time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Beatmap {
    pub song: String,
    pub bpm: f32,
    pub sample_rate: u32,
    pub tracks: BTreeMap<String, Vec<Event>>,
}

pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Builds one track's events from parallel time/strength lists. Times beyond
/// the strength list default to full strength. Events are rounded to 3
/// decimals and re-sorted; extraction is already time-ordered, but the sort
/// keeps the invariant explicit and idempotent.
pub fn track_events(times: &[f32], strengths: &[f32]) -> Vec<Event> {
    let mut events: Vec<Event> = times
        .iter()
        .enumerate()
        .map(|(i, &t)| Event {
            time: round3(t as f64),
            strength: round3(strengths.get(i).copied().unwrap_or(1.0) as f64),
        })
        .collect();
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    events
}

impl Beatmap {
    pub fn load(path: impl AsRef<Path>) -> Result<Beatmap, Box<dyn Error>> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&s)?)
    }

    /// Writes the beatmap as pretty-printed JSON, re-normalizing first so the
    /// on-disk form always satisfies the rounding and ordering invariants
    /// (edits drag raw times around).
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
        self.normalize();
        let s = serde_json::to_string_pretty(self)?;
        std::fs::write(path, s)?;
        Ok(())
    }

    /// Rounds every event to 3 decimals and restores per-track time order.
    pub fn normalize(&mut self) {
        for events in self.tracks.values_mut() {
            for e in events.iter_mut() {
                e.time = round3(e.time);
                e.strength = round3(e.strength);
            }
            events.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
    }

    /// Latest event time across all tracks.
    pub fn last_event_time(&self) -> f64 {
        self.tracks
            .values()
            .flatten()
            .map(|e| e.time)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_beatmap() -> Beatmap {
        let mut tracks = BTreeMap::new();
        tracks.insert("Kick".to_owned(), track_events(&[0.5, 1.0], &[0.0, 1.0]));
        tracks.insert("Snare".to_owned(), track_events(&[0.25], &[1.0]));
        Beatmap {
            song: "song.mp3".to_owned(),
            bpm: 128.0,
            sample_rate: 22050,
            tracks,
        }
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.50049), 0.5);
        assert_eq!(round3(0.9999), 1.0);
        assert_eq!(round3(1.2344999), 1.234);
    }

    #[test]
    fn test_track_events_sorted() {
        let events = track_events(&[1.0, 0.5, 0.75], &[0.1, 0.2, 0.3]);
        assert!(events.windows(2).all(|w| w[0].time <= w[1].time));
        assert_eq!(events[0], Event { time: 0.5, strength: 0.2 });
    }

    #[test]
    fn test_track_events_missing_strength_defaults() {
        let events = track_events(&[0.1, 0.2], &[]);
        assert!(events.iter().all(|e| e.strength == 1.0));
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut map = sample_beatmap();
        let path = std::env::temp_dir().join("drumline_roundtrip.json");
        map.save(&path).unwrap();
        let loaded = Beatmap::load(&path).unwrap();
        assert_eq!(map, loaded);

        // saving what was loaded changes nothing further
        let mut again = loaded.clone();
        again.save(&path).unwrap();
        assert_eq!(loaded, again);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_normalize_restores_order() {
        let mut map = sample_beatmap();
        map.tracks.get_mut("Kick").unwrap()[0].time = 7.7774;
        map.normalize();
        let kick = &map.tracks["Kick"];
        assert_eq!(kick[1].time, 7.777);
        assert!(kick.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn test_last_event_time() {
        assert_eq!(sample_beatmap().last_event_time(), 1.0);
    }
}
