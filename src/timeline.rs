//! Shared time-to-space mapping for the editor and the play view.

use macroquad::prelude::*;

/// Baseline note radius in pixels; triggering pulses it up to `HIT_RADIUS`.
pub const BASE_RADIUS: f32 = 10.0;
pub const HIT_RADIUS: f32 = 20.0;
/// Resting and peak color intensity of a note.
pub const BASE_BRIGHTNESS: f32 = 70.0 / 255.0;
const PEAK_BRIGHTNESS: f32 = 1.0;
/// Relaxation rates after a trigger, per second.
const RADIUS_DECAY: f32 = 60.0;
const BRIGHTNESS_DECAY: f32 = 2.4;

/// Monotonic, reversible mapping between event time and a horizontal pixel
/// coordinate. The inverse clamps into `[0, duration]`, so any pointer
/// position yields a valid time.
#[derive(Clone, Copy, Debug)]
pub struct TimeAxis {
    pub duration: f32,
    pub left: f32,
    pub width: f32,
}

impl TimeAxis {
    pub fn x_of(&self, time: f32) -> f32 {
        if self.duration <= 0.0 {
            return self.left;
        }
        self.left + time / self.duration * self.width
    }

    pub fn time_of(&self, x: f32) -> f32 {
        if self.width <= 0.0 {
            return 0.0;
        }
        ((x - self.left) / self.width * self.duration).clamp(0.0, self.duration)
    }
}

/// Spawn/travel geometry of the play view.
#[derive(Clone, Copy, Debug)]
pub struct Scheduler {
    pub spawn_x: f32,
    pub hit_x: f32,
    pub note_speed: f32,
}

impl Scheduler {
    /// Seconds a note takes from spawn position to the hit line.
    pub fn travel_time(&self) -> f32 {
        (self.hit_x - self.spawn_x) / self.note_speed
    }

    pub fn spawn_time(&self, beat_time: f32) -> f32 {
        beat_time - self.travel_time()
    }
}

/// Observable phase of a note. `Triggered` covers the pulse and its decay;
/// there is no terminal state, a triggered note stays live indefinitely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteState {
    Pending,
    Moving,
    Triggered,
}

/// Renderable entity derived from one beatmap event. Inert until its spawn
/// time, then advances linearly until it crosses the hit line, where it
/// pulses exactly once and relaxes back toward baseline.
pub struct RuntimeNote {
    pub beat_time: f32,
    pub spawn_time: f32,
    pub pos: Vec2,
    pub radius: f32,
    pub brightness: f32,
    pub triggered: bool,
    pub lane: usize,
}

impl RuntimeNote {
    pub fn new(beat_time: f32, strength: f32, lane: usize, origin: Vec2, sched: &Scheduler) -> Self {
        Self {
            beat_time,
            spawn_time: sched.spawn_time(beat_time),
            pos: origin,
            // stronger hits read slightly larger
            radius: BASE_RADIUS * (0.8 + 0.4 * strength),
            brightness: BASE_BRIGHTNESS,
            triggered: false,
            lane,
        }
    }

    pub fn state(&self, now: f32) -> NoteState {
        if now < self.spawn_time {
            NoteState::Pending
        } else if self.triggered {
            NoteState::Triggered
        } else {
            NoteState::Moving
        }
    }

    /// One simulation tick. Returns true on the tick the note crosses the
    /// hit line.
    pub fn update(&mut self, dir: Vec2, speed: f32, dt: f32, now: f32, hit_x: f32) -> bool {
        if now < self.spawn_time {
            return false;
        }
        self.pos += dir * speed * dt;

        let mut fired = false;
        if !self.triggered && (self.pos - vec2(hit_x, self.pos.y)).dot(dir) > 0.0 {
            self.radius = HIT_RADIUS;
            self.brightness = PEAK_BRIGHTNESS;
            self.triggered = true;
            fired = true;
        }
        if self.triggered && !fired {
            self.radius = (self.radius - RADIUS_DECAY * dt).max(BASE_RADIUS);
            self.brightness = (self.brightness - BRIGHTNESS_DECAY * dt).max(BASE_BRIGHTNESS);
        }
        fired
    }
}
