//! Discrete keyboard navigation: one fixed step per key-press event.

use crate::camera::Camera;
use winit::keyboard::KeyCode;

/// Translation applied per key press (world units).
pub const TRANSLATION_STEP: f32 = 0.1;
/// Rotation applied per key press (radians).
pub const ROTATION_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    StrafeLeft,
    StrafeRight,
    Forward,
    Back,
    Up,
    Down,
    YawLeft,
    YawRight,
}

impl NavKey {
    /// A/D strafe, W/S walk, Space/Ctrl rise and sink, Q/E turn.
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        Some(match code {
            KeyCode::KeyA => NavKey::StrafeLeft,
            KeyCode::KeyD => NavKey::StrafeRight,
            KeyCode::KeyW => NavKey::Forward,
            KeyCode::KeyS => NavKey::Back,
            KeyCode::Space => NavKey::Up,
            KeyCode::ControlLeft | KeyCode::ControlRight => NavKey::Down,
            KeyCode::KeyQ => NavKey::YawLeft,
            KeyCode::KeyE => NavKey::YawRight,
            _ => return None,
        })
    }
}

/// Applies one navigation step to the camera.
///
/// Strafing moves along world Z; walking follows the horizontal heading of
/// the camera's view direction.
pub fn apply(key: NavKey, camera: &mut Camera) {
    match key {
        NavKey::StrafeLeft => camera.position.z -= TRANSLATION_STEP,
        NavKey::StrafeRight => camera.position.z += TRANSLATION_STEP,
        NavKey::Forward | NavKey::Back => {
            let dir = camera.world_direction();
            let theta = dir.x.atan2(dir.z);
            let sign = if key == NavKey::Forward { 1.0 } else { -1.0 };
            camera.position.x += sign * TRANSLATION_STEP * theta.sin();
            camera.position.z += sign * TRANSLATION_STEP * theta.cos();
        }
        NavKey::Up => camera.position.y += TRANSLATION_STEP,
        NavKey::Down => camera.position.y -= TRANSLATION_STEP,
        NavKey::YawLeft => camera.yaw += ROTATION_STEP,
        NavKey::YawRight => camera.yaw -= ROTATION_STEP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn camera() -> Camera {
        let mut cam = Camera::new(1.0);
        cam.position = Vec3::new(1.0, 2.0, 3.0);
        cam
    }

    #[test]
    fn forward_at_zero_yaw_moves_along_z() {
        let mut cam = camera();
        apply(NavKey::Forward, &mut cam);
        assert_eq!(cam.position.x, 1.0);
        assert!((cam.position.z - (3.0 + TRANSLATION_STEP)).abs() < 1e-6);
    }

    #[test]
    fn back_undoes_forward_when_turned() {
        let mut cam = camera();
        cam.yaw = 0.9;
        apply(NavKey::Forward, &mut cam);
        let moved = cam.position;
        assert!((moved - Vec3::new(1.0, 2.0, 3.0)).length() > 0.09);
        apply(NavKey::Back, &mut cam);
        assert!(cam.position.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-5));
    }

    #[test]
    fn yaw_keys_change_rotation_by_step() {
        let mut cam = camera();
        apply(NavKey::YawLeft, &mut cam);
        assert_eq!(cam.yaw, ROTATION_STEP);
        apply(NavKey::YawRight, &mut cam);
        apply(NavKey::YawRight, &mut cam);
        assert!((cam.yaw + ROTATION_STEP).abs() < 1e-6);
    }

    #[test]
    fn strafe_and_vertical_follow_world_axes() {
        let mut cam = camera();
        cam.yaw = 1.0;
        apply(NavKey::StrafeRight, &mut cam);
        apply(NavKey::Up, &mut cam);
        assert!((cam.position.z - 3.1).abs() < 1e-6);
        assert!((cam.position.y - 2.1).abs() < 1e-6);
        apply(NavKey::StrafeLeft, &mut cam);
        apply(NavKey::Down, &mut cam);
        assert!(cam.position.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn key_mapping() {
        assert_eq!(NavKey::from_key_code(KeyCode::KeyW), Some(NavKey::Forward));
        assert_eq!(NavKey::from_key_code(KeyCode::ControlRight), Some(NavKey::Down));
        assert_eq!(NavKey::from_key_code(KeyCode::KeyZ), None);
    }
}
