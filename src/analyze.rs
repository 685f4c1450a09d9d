//! Full analysis pipeline: band split, onset extraction, tempo, assembly.

use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::Audio;
use crate::beatmap::{self, Beatmap};
use crate::config::Config;
use crate::stems::{self, StemSeparator};
use crate::{bands, onset, tempo};

/// Directory that per-song output folders are created under.
const SONGS_DIR: &str = "songs";

/// Analyzes an isolated drum recording into a beatmap. `song` is the
/// identifier stored in the output schema.
pub fn analyze(audio: &Audio, song: &str, config: &Config) -> Beatmap {
    let mut tracks = BTreeMap::new();
    for (class, filtered) in bands::split(&audio.samples, audio.sample_rate, &config.bands) {
        let onsets = onset::detect(&filtered, audio.sample_rate, config);
        log::info!("{}: {} onsets", class, onsets.times.len());
        tracks.insert(
            class.to_owned(),
            beatmap::track_events(&onsets.times, &onsets.strengths),
        );
    }

    let env = onset::envelope(&audio.samples, config);
    let bpm = tempo::estimate(&env, config.frame_rate(audio.sample_rate));

    Beatmap {
        song: song.to_owned(),
        bpm,
        sample_rate: audio.sample_rate,
        tracks,
    }
}

pub struct GenerateOutput {
    pub beatmap: Beatmap,
    pub beatmap_path: PathBuf,
    pub stem_path: PathBuf,
}

/// Generation entry point: moves the song into `songs/<name>/`, separates the
/// drum stem, analyzes it, and writes `<name>.json` alongside.
pub fn generate(
    song: &Path,
    config: &Config,
    separator: &dyn StemSeparator,
) -> Result<GenerateOutput, Box<dyn Error>> {
    let name = song
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or("input file has no usable name")?
        .to_owned();
    let file_name = song.file_name().ok_or("input file has no usable name")?;

    let out_dir = Path::new(SONGS_DIR).join(&name);
    fs::create_dir_all(&out_dir)?;
    let dest = out_dir.join(file_name);
    stems::move_file(song, &dest)?;

    let stem_path = separator.separate(&dest, &out_dir)?;
    let audio = Audio::load_wav(&stem_path)?;
    log::info!("loaded {} ({} Hz)", stem_path.display(), audio.sample_rate);

    let mut map = analyze(&audio, &song.to_string_lossy(), config);
    let beatmap_path = out_dir.join(format!("{name}.json"));
    map.save(&beatmap_path)?;

    Ok(GenerateOutput {
        beatmap: map,
        beatmap_path,
        stem_path,
    })
}
