//! The rhythm-game view: scheduled notes travelling toward the hit line.

use std::sync::Arc;

use macroquad::prelude::*;

use crate::audio::Audio;
use crate::beatmap::Beatmap;
use crate::config::Config;
use crate::timeline::{NoteState, RuntimeNote, Scheduler, HIT_RADIUS};
use crate::transport::{Clock, Transport, WallClock};
use crate::ui::{self, Theme};

/// One `RuntimeNote` per event, across all tracks, in track order. Each track
/// gets its own horizontal lane.
fn build_notes(beatmap: &Beatmap, sched: &Scheduler, top: f32, height: f32) -> Vec<RuntimeNote> {
    let lanes = beatmap.tracks.len().max(1) as f32;
    let mut notes = Vec::new();
    for (lane, events) in beatmap.tracks.values().enumerate() {
        let y = top + height * (lane as f32 + 1.0) / (lanes + 1.0);
        for e in events {
            notes.push(RuntimeNote::new(
                e.time as f32,
                e.strength as f32,
                lane,
                vec2(sched.spawn_x, y),
                sched,
            ));
        }
    }
    notes
}

pub struct Game {
    notes: Vec<RuntimeNote>,
    lane_colors: Vec<Color>,
    sched: Scheduler,
    dir: Vec2,
    clock: Box<dyn Clock>,
    _transport: Option<Transport>,
}

impl Game {
    /// Builds the play state for the loaded beatmap and starts playback of
    /// the song when audio is available. The transport's sample counter is
    /// the reference clock; without audio output the wall clock stands in.
    pub fn new(beatmap: &Beatmap, audio: Option<&Audio>, config: &Config) -> Game {
        let sched = Scheduler {
            spawn_x: -HIT_RADIUS,
            hit_x: screen_width() / 2.0,
            note_speed: config.note_speed,
        };
        let top = ui::TAB_BAR_HEIGHT;
        let height = screen_height() - top - ui::STATUS_HEIGHT;

        let (transport, clock): (Option<Transport>, Box<dyn Clock>) = match audio {
            Some(audio) => {
                match Transport::start(Arc::new(audio.samples.clone()), audio.sample_rate) {
                    Ok((transport, clock)) => (Some(transport), Box::new(clock)),
                    Err(e) => {
                        log::warn!("audio playback unavailable ({e}), using wall clock");
                        (None, Box::new(WallClock::new()))
                    }
                }
            }
            None => (None, Box::new(WallClock::new())),
        };

        Game {
            notes: build_notes(beatmap, &sched, top, height),
            lane_colors: beatmap.tracks.keys().map(|c| ui::class_color(c)).collect(),
            sched,
            dir: vec2(1.0, 0.0),
            clock,
            _transport: transport,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.clock.now()
    }

    pub fn frame(&mut self, theme: &Theme) {
        let now = self.clock.now();
        let dt = get_frame_time();

        draw_line(
            self.sched.hit_x,
            ui::TAB_BAR_HEIGHT,
            self.sched.hit_x,
            screen_height() - ui::STATUS_HEIGHT,
            1.0,
            theme.fg,
        );

        for note in &mut self.notes {
            note.update(self.dir, self.sched.note_speed, dt, now, self.sched.hit_x);
        }

        // reverse creation order, so freshly triggered notes draw on top of
        // older ones
        for note in self.notes.iter().rev() {
            if note.state(now) == NoteState::Pending {
                continue;
            }
            if note.pos.x < -HIT_RADIUS * 2.0 || note.pos.x > screen_width() + HIT_RADIUS {
                continue;
            }
            let base = self.lane_colors[note.lane];
            let b = note.brightness;
            let color = Color::new(base.r * b, base.g * b, base.b * b, 1.0);
            draw_circle(note.pos.x, note.pos.y, note.radius, color);
        }
    }
}
