//! Minimal immediate-mode widgets: tab bar, status line, theme.

use macroquad::prelude::*;

pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub dim: Color,
    pub accent: Color,
}

pub const DARK_THEME: Theme = Theme {
    bg: Color { r: 0.08, g: 0.08, b: 0.09, a: 1.0 },
    fg: Color { r: 0.92, g: 0.92, b: 0.92, a: 1.0 },
    dim: Color { r: 0.45, g: 0.45, b: 0.45, a: 1.0 },
    accent: Color { r: 0.35, g: 0.65, b: 0.95, a: 1.0 },
};

pub const FONT_SIZE: f32 = 16.0;
pub const TAB_BAR_HEIGHT: f32 = 28.0;
pub const STATUS_HEIGHT: f32 = 24.0;

/// Scatter colors per instrument class, matching the editor legend.
pub fn class_color(class: &str) -> Color {
    match class {
        "Kick" => RED,
        "Snare" => ORANGE,
        "Tom" => BLUE,
        "Cymbal" => PURPLE,
        _ => WHITE,
    }
}

/// Draws the tab bar and returns the clicked tab index, if any.
pub fn tab_bar(labels: &[&str], active: usize, theme: &Theme) -> Option<usize> {
    let margin = 8.0;
    let mut x = margin;
    let mut clicked = None;
    let (mouse_x, mouse_y) = mouse_position();

    for (i, label) in labels.iter().enumerate() {
        let dim = measure_text(label, None, FONT_SIZE as u16, 1.0);
        let rect = Rect {
            x,
            y: 0.0,
            w: dim.width + margin * 2.0,
            h: TAB_BAR_HEIGHT,
        };
        let hover = rect.contains(vec2(mouse_x, mouse_y));
        if i == active {
            draw_rectangle(rect.x, rect.y, rect.w, rect.h, theme.accent);
        } else if hover {
            draw_rectangle(rect.x, rect.y, rect.w, rect.h, theme.dim);
        }
        let color = if i == active { theme.bg } else { theme.fg };
        draw_text(label, x + margin, TAB_BAR_HEIGHT - 8.0, FONT_SIZE, color);
        if hover && is_mouse_button_pressed(MouseButton::Left) {
            clicked = Some(i);
        }
        x += rect.w + 2.0;
    }
    draw_line(0.0, TAB_BAR_HEIGHT, screen_width(), TAB_BAR_HEIGHT, 1.0, theme.dim);
    clicked
}

/// Status line pinned to the bottom of the window.
pub fn status_line(text: &str, theme: &Theme) {
    let y = screen_height() - STATUS_HEIGHT;
    draw_line(0.0, y, screen_width(), y, 1.0, theme.dim);
    draw_text(text, 8.0, y + STATUS_HEIGHT - 8.0, FONT_SIZE, theme.fg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_colors_distinct() {
        let classes = ["Kick", "Snare", "Tom", "Cymbal"];
        for (i, a) in classes.iter().enumerate() {
            for b in classes.iter().skip(i + 1) {
                assert_ne!(class_color(a), class_color(b));
            }
        }
        assert_eq!(class_color("Cowbell"), WHITE);
    }
}
