//! Plot-space constants and the running normalization bounds.

use crate::error::{Result, VizError};
use glam::Vec3;
use std::fmt;

/// One of the three plot axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along this axis in world space.
    #[inline]
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// Fixed per-axis line color (X red, Y green, Z blue).
    #[inline]
    pub fn color(self) -> u32 {
        match self {
            Axis::X => 0xFF0000,
            Axis::Y => 0x00FF00,
            Axis::Z => 0x0000FF,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// World-space extent assigned to each axis, independent of data magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotSize {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Point size as a fraction of the largest extent.
    pub point_size_coeff: f32,
}

impl Default for PlotSize {
    fn default() -> Self {
        Self {
            x: 10.0,
            y: 5.0,
            z: 10.0,
            point_size_coeff: 0.01,
        }
    }
}

impl PlotSize {
    #[inline]
    pub fn along(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    #[inline]
    pub fn largest(&self) -> f32 {
        self.x.max(self.y).max(self.z)
    }

    /// Size shared by every point of the cloud.
    #[inline]
    pub fn point_size(&self) -> f32 {
        self.point_size_coeff * self.largest()
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z) * 0.5
    }
}

/// Running maxima of the selected columns.
///
/// Starts at zero and only ever grows while a dataset is scanned.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NormalizationBounds {
    pub largest_x: f64,
    pub largest_y: f64,
    pub largest_z: f64,
}

impl NormalizationBounds {
    #[inline]
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.largest_x,
            Axis::Y => self.largest_y,
            Axis::Z => self.largest_z,
        }
    }

    #[inline]
    pub fn largest_entry(&self) -> f64 {
        self.largest_x.max(self.largest_y).max(self.largest_z)
    }

    /// Raise the bound of `axis` to `value` if it is larger.
    #[inline]
    pub fn observe(&mut self, axis: Axis, value: f64) {
        let slot = match axis {
            Axis::X => &mut self.largest_x,
            Axis::Y => &mut self.largest_y,
            Axis::Z => &mut self.largest_z,
        };
        if value > *slot {
            *slot = value;
        }
    }

    /// The divisor used to normalize values on `axis`.
    ///
    /// Fails with `DivisionDegenerate` while the bound is not strictly positive;
    /// callers then treat the axis as constant zero.
    pub fn divisor(&self, axis: Axis) -> Result<f64> {
        let bound = self.get(axis);
        if bound > 0.0 && bound.is_finite() {
            Ok(bound)
        } else {
            Err(VizError::DivisionDegenerate { axis, bound })
        }
    }

    /// Axes whose bound never became positive.
    pub fn degenerate_axes(&self) -> Vec<Axis> {
        Axis::ALL
            .into_iter()
            .filter(|a| self.divisor(*a).is_err())
            .collect()
    }
}

/// Split a `0xRRGGBB` color into linear `[r, g, b]` floats.
#[inline]
pub fn hex_to_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}
