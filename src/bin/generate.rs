//! Beatmap generation CLI: song file in, per-song output directory out.

use std::path::Path;
use std::process::exit;

use drumline::analyze;
use drumline::config::Config;
use drumline::stems::DemucsCli;

fn main() {
    env_logger::init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: generate <song_file>");
        exit(1);
    };

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            log::info!("using default config ({e})");
            Config::default()
        }
    };
    let separator = DemucsCli::new(&config.demucs_model);

    match analyze::generate(Path::new(&path), &config, &separator) {
        Ok(out) => {
            println!("Drums exported to {}", out.stem_path.display());
            for (class, events) in &out.beatmap.tracks {
                println!("{}: {} hits detected", class, events.len());
            }
            println!("Tempo estimate: {:.1} bpm", out.beatmap.bpm);
            println!("Beatmap exported to {}", out.beatmap_path.display());
        }
        Err(e) => {
            eprintln!("error: {e}");
            exit(1);
        }
    }
}
