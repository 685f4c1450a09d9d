//! Timeline editing: pick, drag, release, save.

use macroquad::prelude::*;

use crate::beatmap::Beatmap;
use crate::timeline::TimeAxis;
use crate::ui::{self, Theme};

const MARGIN: f32 = 40.0;
/// Extra pick slop around a point, in pixels.
const PICK_SLOP: f32 = 3.0;

/// Live while a pointer button is held on a point; cleared on release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub lane: usize,
    pub index: usize,
}

/// The editable timeline view. Lane indices are assigned once, from track
/// order at load time; rendered point positions are cached per lane and only
/// the affected lane is recomputed on drag.
pub struct EditorView {
    lanes: Vec<String>,
    points: Vec<Vec<Vec2>>,
    pub selection: Option<Selection>,
    duration: f32,
    size: (f32, f32),
}

fn point_radius(strength: f64) -> f32 {
    3.0 + 5.0 * strength as f32
}

impl EditorView {
    pub fn new(beatmap: &Beatmap, duration: f32) -> Self {
        let lanes: Vec<String> = beatmap.tracks.keys().cloned().collect();
        Self {
            points: vec![Vec::new(); lanes.len()],
            lanes,
            selection: None,
            duration,
            size: (0.0, 0.0),
        }
    }

    pub fn lane_name(&self, lane: usize) -> &str {
        &self.lanes[lane]
    }

    fn axis(&self) -> TimeAxis {
        TimeAxis {
            duration: self.duration,
            left: MARGIN,
            width: (self.size.0 - 2.0 * MARGIN).max(1.0),
        }
    }

    fn lane_y(&self, lane: usize) -> f32 {
        let top = ui::TAB_BAR_HEIGHT;
        let height = self.size.1 - top - ui::STATUS_HEIGHT;
        let n = self.lanes.len().max(1) as f32;
        top + height * (lane as f32 + 1.0) / (n + 1.0)
    }

    /// Recomputes cached point positions when the window size changes.
    pub fn layout(&mut self, w: f32, h: f32, beatmap: &Beatmap) {
        if self.size != (w, h) {
            self.size = (w, h);
            for lane in 0..self.lanes.len() {
                self.rebuild_lane(lane, beatmap);
            }
        }
    }

    /// Rebuilds every lane's cached positions, after wholesale changes like
    /// a save-time renormalization.
    pub fn refresh(&mut self, beatmap: &Beatmap) {
        for lane in 0..self.lanes.len() {
            self.rebuild_lane(lane, beatmap);
        }
    }

    fn rebuild_lane(&mut self, lane: usize, beatmap: &Beatmap) {
        let axis = self.axis();
        let y = self.lane_y(lane);
        let events = match beatmap.tracks.get(&self.lanes[lane]) {
            Some(events) => events,
            None => return,
        };
        self.points[lane] = events
            .iter()
            .map(|e| vec2(axis.x_of(e.time as f32), y))
            .collect();
    }

    /// Hit-tests the pointer against every rendered point, selecting the
    /// first match.
    pub fn pick(&mut self, mouse: Vec2, beatmap: &Beatmap) -> Option<Selection> {
        for (lane, points) in self.points.iter().enumerate() {
            let events = match beatmap.tracks.get(&self.lanes[lane]) {
                Some(events) => events,
                None => continue,
            };
            for (index, p) in points.iter().enumerate() {
                let r = point_radius(events[index].strength) + PICK_SLOP;
                if mouse.distance_squared(*p) <= r * r {
                    let selection = Selection { lane, index };
                    self.selection = Some(selection);
                    return Some(selection);
                }
            }
        }
        None
    }

    /// Moves the selected event to the time under pixel `x`, clamped into
    /// the track bounds. No-op without a selection.
    pub fn drag(&mut self, x: f32, beatmap: &mut Beatmap) {
        let Some(sel) = self.selection else {
            return;
        };
        let time = self.axis().time_of(x);
        if let Some(events) = beatmap.tracks.get_mut(&self.lanes[sel.lane]) {
            if let Some(event) = events.get_mut(sel.index) {
                event.time = time as f64;
                self.rebuild_lane(sel.lane, beatmap);
            }
        }
    }

    /// Clears the selection; returns whether anything was selected.
    pub fn release(&mut self) -> bool {
        self.selection.take().is_some()
    }

    pub fn draw(&mut self, beatmap: &Beatmap, peaks: Option<&[(f32, f32)]>, theme: &Theme) {
        self.layout(screen_width(), screen_height(), beatmap);
        let axis = self.axis();

        if let Some(peaks) = peaks {
            let mid = self.size.1 / 2.0;
            let scale = (self.size.1 - ui::TAB_BAR_HEIGHT - ui::STATUS_HEIGHT) / 2.0;
            for (i, &(min, max)) in peaks.iter().enumerate() {
                let x = axis.left + axis.width * i as f32 / peaks.len() as f32;
                draw_line(x, mid - max * scale, x, mid - min * scale, 1.0, theme.dim);
            }
        }

        for (lane, points) in self.points.iter().enumerate() {
            let name = &self.lanes[lane];
            let events = match beatmap.tracks.get(name) {
                Some(events) => events,
                None => continue,
            };
            let color = ui::class_color(name);
            draw_text(name, 4.0, self.lane_y(lane) + 4.0, ui::FONT_SIZE, color);
            for (index, p) in points.iter().enumerate() {
                draw_circle(p.x, p.y, point_radius(events[index].strength), color);
                if self.selection == Some(Selection { lane, index }) {
                    let r = point_radius(events[index].strength) + PICK_SLOP;
                    draw_circle_lines(p.x, p.y, r, 1.5, theme.fg);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beatmap::track_events;
    use std::collections::BTreeMap;

    fn test_beatmap() -> Beatmap {
        let mut tracks = BTreeMap::new();
        tracks.insert("Kick".to_owned(), track_events(&[1.0, 5.0], &[1.0, 1.0]));
        tracks.insert("Snare".to_owned(), track_events(&[2.0], &[0.5]));
        Beatmap {
            song: "song".to_owned(),
            bpm: 120.0,
            sample_rate: 22050,
            tracks,
        }
    }

    fn test_editor(beatmap: &Beatmap) -> EditorView {
        let mut editor = EditorView::new(beatmap, 10.0);
        editor.layout(800.0, 600.0, beatmap);
        editor
    }

    #[test]
    fn test_lanes_assigned_in_track_order() {
        let map = test_beatmap();
        let editor = test_editor(&map);
        assert_eq!(editor.lane_name(0), "Kick");
        assert_eq!(editor.lane_name(1), "Snare");
    }

    #[test]
    fn test_pick_selects_first_match() {
        let map = test_beatmap();
        let mut editor = test_editor(&map);
        let p = editor.points[0][1];
        let sel = editor.pick(p, &map).unwrap();
        assert_eq!(sel, Selection { lane: 0, index: 1 });
        assert_eq!(editor.selection, Some(sel));
    }

    #[test]
    fn test_pick_misses_empty_space() {
        let map = test_beatmap();
        let mut editor = test_editor(&map);
        assert!(editor.pick(vec2(1.0, 1.0), &map).is_none());
        assert!(editor.selection.is_none());
    }

    #[test]
    fn test_drag_moves_selected_event() {
        let mut map = test_beatmap();
        let mut editor = test_editor(&map);
        let p = editor.points[0][0];
        editor.pick(p, &map).unwrap();

        let target = editor.axis().x_of(3.0);
        editor.drag(target, &mut map);
        assert!((map.tracks["Kick"][0].time - 3.0).abs() < 0.01);
        // only the affected lane's cache is rebuilt
        assert!((editor.points[0][0].x - target).abs() < 0.5);
    }

    #[test]
    fn test_drag_clamps_to_track_bounds() {
        let mut map = test_beatmap();
        let mut editor = test_editor(&map);
        let p = editor.points[0][0];
        editor.pick(p, &map).unwrap();

        editor.drag(10_000.0, &mut map);
        assert_eq!(map.tracks["Kick"][0].time, 10.0);
        editor.drag(-10_000.0, &mut map);
        assert_eq!(map.tracks["Kick"][0].time, 0.0);
    }

    #[test]
    fn test_drag_without_selection_is_noop() {
        let mut map = test_beatmap();
        let mut editor = test_editor(&map);
        let before = map.clone();
        editor.drag(400.0, &mut map);
        assert_eq!(map, before);
    }

    #[test]
    fn test_release_clears_selection() {
        let map = test_beatmap();
        let mut editor = test_editor(&map);
        assert!(!editor.release());
        let p = editor.points[0][0];
        editor.pick(p, &map).unwrap();
        assert!(editor.release());
        assert!(editor.selection.is_none());
    }
}
