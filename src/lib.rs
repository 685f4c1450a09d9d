//! Drum beatmap toolkit: analysis pipeline, timeline editor, and a
//! rhythm-game preview synchronized to the running audio clock.

use std::error::Error;
use std::path::{Path, PathBuf};

use macroquad::prelude::*;

pub mod analyze;
pub mod audio;
pub mod bands;
pub mod beatmap;
pub mod config;
pub mod dsp;
mod editor;
mod game;
pub mod onset;
pub mod stems;
pub mod tempo;
pub mod timeline;
pub mod transport;
mod ui;

use audio::Audio;
use beatmap::Beatmap;
use config::Config;
use editor::EditorView;
use game::Game;
use ui::DARK_THEME;

/// Application name, for window title, etc.
pub const APP_NAME: &str = "Drumline";

const TABS: [&str; 2] = ["Edit", "Play"];
const TAB_EDIT: usize = 0;
const TAB_PLAY: usize = 1;

/// Columns in the editor's waveform underlay.
const WAVEFORM_COLUMNS: usize = 1024;

/// A beatmap opened for editing, with whatever audio could be found for it.
struct Loaded {
    beatmap: Beatmap,
    path: PathBuf,
    audio: Option<Audio>,
    peaks: Vec<(f32, f32)>,
    editor: EditorView,
}

impl Loaded {
    fn open(path: PathBuf) -> Result<Loaded, Box<dyn Error>> {
        let beatmap = Beatmap::load(&path)?;
        let audio = find_audio(&path, &beatmap);
        let peaks = audio
            .as_ref()
            .map(|a| a.peaks(WAVEFORM_COLUMNS))
            .unwrap_or_default();
        let duration = audio
            .as_ref()
            .map(|a| a.duration())
            .unwrap_or(beatmap.last_event_time() as f32 + 1.0);
        let editor = EditorView::new(&beatmap, duration);
        Ok(Loaded { beatmap, path, audio, peaks, editor })
    }
}

/// The drum stem next to the beatmap is preferred; the song path stored in
/// the schema is the fallback.
fn find_audio(beatmap_path: &Path, beatmap: &Beatmap) -> Option<Audio> {
    let dir = beatmap_path.parent().unwrap_or(Path::new("."));
    for candidate in [dir.join("drums.wav"), PathBuf::from(&beatmap.song)] {
        match Audio::load_wav(&candidate) {
            Ok(audio) => return Some(audio),
            Err(e) => log::debug!("no audio at {}: {e}", candidate.display()),
        }
    }
    None
}

struct App {
    config: Config,
    tab: usize,
    loaded: Option<Loaded>,
    game: Option<Game>,
    status: String,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            tab: TAB_EDIT,
            loaded: None,
            game: None,
            status: String::from("Open a beatmap to begin."),
        }
    }

    fn open(&mut self, path: PathBuf) {
        match Loaded::open(path) {
            Ok(loaded) => {
                self.status = format!("Loaded {}.", loaded.path.display());
                self.loaded = Some(loaded);
                self.game = None;
                self.tab = TAB_EDIT;
            }
            Err(e) => self.status = format!("Error: {e}"),
        }
    }

    fn set_tab(&mut self, tab: usize) {
        if tab == self.tab {
            return;
        }
        self.tab = tab;
        // entering the play tab (re)builds the game state and restarts
        // playback; leaving it stops both
        self.game = if tab == TAB_PLAY {
            self.loaded
                .as_ref()
                .map(|l| Game::new(&l.beatmap, l.audio.as_ref(), &self.config))
        } else {
            None
        };
    }

    fn handle_keys(&mut self) {
        if is_key_pressed(KeyCode::Tab) {
            self.set_tab((self.tab + 1) % TABS.len());
        }
        if self.tab == TAB_EDIT && is_key_pressed(KeyCode::S) {
            self.save();
        }
    }

    /// Writes the whole beatmap back to its source file, synchronously.
    fn save(&mut self) {
        let Some(loaded) = &mut self.loaded else {
            self.status = String::from("Nothing to save.");
            return;
        };
        loaded.editor.release();
        match loaded.beatmap.save(&loaded.path) {
            Ok(()) => {
                // normalization may have reordered events
                loaded.editor.refresh(&loaded.beatmap);
                self.status = String::from("Saved beatmap.");
            }
            Err(e) => self.status = format!("Error: {e}"),
        }
    }

    fn edit_frame(&mut self) {
        let Some(loaded) = &mut self.loaded else {
            draw_text(
                "No beatmap loaded. Pass a path on the command line.",
                40.0,
                80.0,
                ui::FONT_SIZE,
                DARK_THEME.fg,
            );
            return;
        };

        let (mx, my) = mouse_position();
        if is_mouse_button_pressed(MouseButton::Left) {
            if let Some(sel) = loaded.editor.pick(vec2(mx, my), &loaded.beatmap) {
                self.status = format!(
                    "Selected {} #{}",
                    loaded.editor.lane_name(sel.lane),
                    sel.index
                );
            }
        } else if is_mouse_button_down(MouseButton::Left) {
            loaded.editor.drag(mx, &mut loaded.beatmap);
        }
        if is_mouse_button_released(MouseButton::Left) {
            if let Some(sel) = loaded.editor.selection {
                self.status = format!(
                    "Released {} #{}",
                    loaded.editor.lane_name(sel.lane),
                    sel.index
                );
            }
            loaded.editor.release();
        }

        let peaks = (!loaded.peaks.is_empty()).then_some(loaded.peaks.as_slice());
        loaded.editor.draw(&loaded.beatmap, peaks, &DARK_THEME);
    }

    fn play_frame(&mut self) {
        match &mut self.game {
            Some(game) => {
                game.frame(&DARK_THEME);
                self.status = format!("Playing, {:.1} s", game.elapsed());
            }
            None => {
                draw_text(
                    "No beatmap loaded.",
                    40.0,
                    80.0,
                    ui::FONT_SIZE,
                    DARK_THEME.fg,
                );
            }
        }
    }

    fn frame(&mut self) {
        clear_background(DARK_THEME.bg);
        self.handle_keys();
        if let Some(tab) = ui::tab_bar(&TABS, self.tab, &DARK_THEME) {
            self.set_tab(tab);
        }
        match self.tab {
            TAB_EDIT => self.edit_frame(),
            TAB_PLAY => self.play_frame(),
            _ => panic!("bad tab value"),
        }
        ui::status_line(&self.status, &DARK_THEME);
    }
}

/// Application entry point.
pub async fn run(arg: Option<String>) {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            log::info!("using default config ({e})");
            let c = Config::default();
            if let Err(e) = c.save() {
                log::warn!("could not write config: {e}");
            }
            c
        }
    };

    let mut app = App::new(config);
    if let Some(arg) = arg {
        app.open(PathBuf::from(arg));
    }

    loop {
        app.frame();
        next_frame().await
    }
}
