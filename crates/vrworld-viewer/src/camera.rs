use crate::data::types::ViewUniform;
use crate::selection::Ray;
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

/// Standing eye height used before a headset reports its own.
pub const USER_HEIGHT_M: f32 = 1.6;

/// Pitch is kept just short of straight up/down so the view basis stays valid.
const PITCH_LIMIT_RAD: f32 = 89.0 * std::f32::consts::PI / 180.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye position in world space.
    pub position: Vec3,
    /// Rotation about world +Y (radians). Zero faces +Z.
    pub yaw: f32,
    /// Rotation about the camera's local X axis (radians). Positive looks down.
    pub pitch: f32,

    // --- Projection ---
    pub fov_y_rad: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Creates a perspective camera at standing height facing +Z.
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, USER_HEIGHT_M, 0.0),
            yaw: 0.0,
            pitch: 0.0,
            fov_y_rad: 75f32.to_radians(),
            aspect,
            near: 0.1,
            far: 10_000.0,
        }
    }

    #[inline]
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Unit vector the camera is looking along.
    #[inline]
    pub fn world_direction(&self) -> Vec3 {
        self.orientation() * Vec3::Z
    }

    /// Unit vector to the camera's right, parallel to the ground.
    #[inline]
    pub fn right(&self) -> Vec3 {
        let (s, c) = self.yaw.sin_cos();
        Vec3::new(-c, 0.0, s)
    }

    /// Turns the camera to face `target`. No-op if the target is the eye.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.position;
        if dir.length_squared() <= f32::EPSILON {
            return;
        }
        let dir = dir.normalize();
        self.yaw = dir.x.atan2(dir.z);
        self.pitch = (-dir.y).clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT_RAD, PITCH_LIMIT_RAD);
    }

    /// Zeroes the orientation, as when leaving a headset session.
    pub fn reset_orientation(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
    }

    /// Adopts the rotation of a tracked pose. Poses look down their local
    /// -Z while the camera looks down +Z, so the pose is turned half a
    /// revolution about its own up axis first. Roll is dropped.
    pub fn set_orientation(&mut self, q: Quat) {
        let facing = q * Quat::from_rotation_y(std::f32::consts::PI);
        let (yaw, pitch, _roll) = facing.to_euler(EulerRot::YXZ);
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT_RAD, PITCH_LIMIT_RAD);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.world_direction(), Vec3::Y)
    }

    /// View matrix for an eye shifted sideways by `offset_m` (left negative).
    pub fn eye_view(&self, offset_m: f32) -> Mat4 {
        let eye = self.position + self.right() * offset_m;
        Mat4::look_to_rh(eye, self.world_direction(), Vec3::Y)
    }

    /// Projection for a viewport with the given aspect ratio. wgpu expects
    /// depth in [0, 1], which `perspective_rh` already produces.
    #[inline]
    pub fn proj_with_aspect(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad, aspect, self.near, self.far)
    }

    #[inline]
    pub fn proj(&self) -> Mat4 {
        self.proj_with_aspect(self.aspect)
    }

    #[inline]
    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }

    /// Uniform block for the window view.
    pub fn view_uniform(&self) -> ViewUniform {
        ViewUniform {
            view_proj: self.view_proj().to_cols_array_2d(),
            view: self.view().to_cols_array_2d(),
        }
    }

    /// Uniform block for one stereo eye rendered at `aspect`.
    pub fn eye_uniform(&self, offset_m: f32, aspect: f32) -> ViewUniform {
        let view = self.eye_view(offset_m);
        ViewUniform {
            view_proj: (self.proj_with_aspect(aspect) * view).to_cols_array_2d(),
            view: view.to_cols_array_2d(),
        }
    }

    /// World-space ray through a point given in normalized device coordinates
    /// (x right, y up, both in [-1, 1]).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.view_proj().inverse();
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }
}
