//! Mouse pointer tracking and click detection for point picking.

use glam::Vec2;

/// A press and release further apart than this is a drag, not a click.
const CLICK_SLOP_PX: f32 = 4.0;

#[derive(Debug, Clone, Default)]
pub struct PointerState {
    cursor: Option<Vec2>,
    pressed_at: Option<Vec2>,
    click: Option<Vec2>,
}

impl PointerState {
    pub fn cursor_moved(&mut self, pos: Vec2) {
        self.cursor = Some(pos);
    }

    pub fn cursor_left(&mut self) {
        self.cursor = None;
        self.pressed_at = None;
    }

    pub fn pressed(&mut self) {
        self.pressed_at = self.cursor;
    }

    /// Returns whether the release completed a click.
    pub fn released(&mut self) -> bool {
        match (self.pressed_at.take(), self.cursor) {
            (Some(down), Some(up)) if down.distance(up) <= CLICK_SLOP_PX => {
                self.click = Some(up);
                true
            }
            _ => false,
        }
    }

    /// Takes the pending click position, if any.
    pub fn take_click(&mut self) -> Option<Vec2> {
        self.click.take()
    }
}

/// Converts a pixel position to normalized device coordinates.
pub fn to_ndc(pos: Vec2, size: Vec2) -> Vec2 {
    Vec2::new(2.0 * pos.x / size.x - 1.0, 1.0 - 2.0 * pos.y / size.y)
}
