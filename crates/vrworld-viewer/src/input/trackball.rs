//! Continuous trackball controls: rotate, zoom and pan around a target.
//!
//! Window events only accumulate motion; `update` applies it to the camera
//! once per frame.

use crate::camera::Camera;
use glam::{Quat, Vec2, Vec3};

/// Motion below this is treated as none.
const EPS: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
}

#[derive(Debug, Clone)]
pub struct TrackballControls {
    /// Point the camera orbits and faces.
    pub target: Vec3,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub no_zoom: bool,
    pub no_pan: bool,
    /// When set, motion stops as soon as input stops; otherwise it decays by
    /// `dynamic_damping_factor` each frame.
    pub static_moving: bool,
    pub dynamic_damping_factor: f32,

    drag: Option<DragMode>,
    last_cursor: Option<Vec2>,
    rotate_delta: Vec2,
    pan_delta: Vec2,
    zoom_delta: f32,
}

impl Default for TrackballControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            rotate_speed: 1.0,
            zoom_speed: 10.0,
            pan_speed: 10.0,
            no_zoom: false,
            no_pan: false,
            static_moving: true,
            dynamic_damping_factor: 0.3,
            drag: None,
            last_cursor: None,
            rotate_delta: Vec2::ZERO,
            pan_delta: Vec2::ZERO,
            zoom_delta: 0.0,
        }
    }
}

impl TrackballControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn begin_drag(&mut self, mode: DragMode) {
        self.drag = Some(mode);
    }

    pub fn end_drag(&mut self, mode: DragMode) {
        if self.drag == Some(mode) {
            self.drag = None;
        }
    }

    /// Feeds a cursor position (physical pixels) for a viewport of `size`.
    pub fn cursor_moved(&mut self, pos: Vec2, size: Vec2) {
        if let (Some(last), Some(mode)) = (self.last_cursor, self.drag) {
            if size.x > 0.0 && size.y > 0.0 {
                let d = pos - last;
                match mode {
                    // Normalized by half width; y up.
                    DragMode::Rotate => {
                        self.rotate_delta += Vec2::new(d.x, -d.y) / (size.x * 0.5)
                    }
                    // Fraction of the screen; y down.
                    DragMode::Pan => self.pan_delta += d / size,
                }
            }
        }
        self.last_cursor = Some(pos);
    }

    /// Feeds wheel motion in lines; positive scrolls up (zoom in).
    pub fn scroll(&mut self, lines: f32) {
        self.zoom_delta -= lines * 0.01;
    }

    /// Applies pending motion to `camera`. Returns whether the camera moved.
    /// A camera with no pending motion is left exactly as it was.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let mut eye = camera.position - self.target;
        let mut moved = false;

        let angle = self.rotate_delta.length() * self.rotate_speed;
        if angle > EPS && eye.length_squared() > EPS {
            let up = camera.orientation() * Vec3::Y;
            let side = up.cross(eye.normalize());
            let move_dir = up * self.rotate_delta.y + side * self.rotate_delta.x;
            let axis = move_dir.cross(eye);
            if axis.length_squared() > EPS {
                eye = Quat::from_axis_angle(axis.normalize(), angle) * eye;
                moved = true;
            }
        }

        if !self.no_zoom && self.zoom_delta.abs() > EPS {
            let factor = (1.0 + self.zoom_delta * self.zoom_speed).max(0.05);
            eye *= factor;
            moved = true;
        }

        if !self.no_pan && self.pan_delta.length_squared() > EPS * EPS {
            let change = self.pan_delta * eye.length() * self.pan_speed;
            let up = camera.orientation() * Vec3::Y;
            let pan = eye.cross(up).normalize_or_zero() * change.x + up * change.y;
            self.target += pan;
            moved = true;
        }

        if self.static_moving {
            self.rotate_delta = Vec2::ZERO;
            self.pan_delta = Vec2::ZERO;
            self.zoom_delta = 0.0;
        } else {
            let keep = 1.0 - self.dynamic_damping_factor;
            self.rotate_delta *= keep;
            self.pan_delta *= keep;
            self.zoom_delta *= keep;
        }

        if moved {
            camera.position = self.target + eye;
            camera.look_at(self.target);
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TrackballControls, Camera) {
        let mut cam = Camera::new(1.0);
        cam.position = Vec3::new(0.0, 0.0, -10.0);
        cam.look_at(Vec3::ZERO);
        (TrackballControls::new(Vec3::ZERO), cam)
    }

    #[test]
    fn idle_update_leaves_camera_untouched() {
        let (mut tb, mut cam) = setup();
        cam.yaw += 0.3;
        let before = cam.clone();
        assert!(!tb.update(&mut cam));
        assert_eq!(cam, before);
    }

    #[test]
    fn rotate_keeps_distance_to_target() {
        let (mut tb, mut cam) = setup();
        let size = Vec2::new(800.0, 600.0);
        tb.begin_drag(DragMode::Rotate);
        tb.cursor_moved(Vec2::new(400.0, 300.0), size);
        tb.cursor_moved(Vec2::new(480.0, 300.0), size);
        assert!(tb.update(&mut cam));

        assert!((cam.position.length() - 10.0).abs() < 1e-4);
        assert!(cam.position.x.abs() > 0.1);
        let facing = (Vec3::ZERO - cam.position).normalize();
        assert!(cam.world_direction().abs_diff_eq(facing, 1e-4));
    }

    #[test]
    fn scroll_up_zooms_in() {
        let (mut tb, mut cam) = setup();
        tb.scroll(1.0);
        assert!(tb.update(&mut cam));
        assert!((cam.position.length() - 9.0).abs() < 1e-4);
    }

    #[test]
    fn static_moving_stops_immediately() {
        let (mut tb, mut cam) = setup();
        tb.scroll(1.0);
        tb.update(&mut cam);
        assert!(!tb.update(&mut cam));
    }

    #[test]
    fn dynamic_moving_decays() {
        let (mut tb, mut cam) = setup();
        tb.static_moving = false;
        tb.scroll(1.0);
        tb.update(&mut cam);
        let after_first = cam.position.length();
        assert!(tb.update(&mut cam));
        let second_step = after_first - cam.position.length();
        assert!(second_step > 0.0);
        assert!(second_step < 10.0 - after_first);
    }

    #[test]
    fn pan_moves_target_with_camera() {
        let (mut tb, mut cam) = setup();
        let size = Vec2::new(800.0, 600.0);
        tb.begin_drag(DragMode::Pan);
        tb.cursor_moved(Vec2::new(100.0, 100.0), size);
        tb.cursor_moved(Vec2::new(100.0, 130.0), size);
        tb.end_drag(DragMode::Pan);
        let offset = cam.position - tb.target;
        assert!(tb.update(&mut cam));
        assert!(tb.target.y > 0.0);
        assert!((cam.position - tb.target).abs_diff_eq(offset, 1e-4));
    }
}
