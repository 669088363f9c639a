//! Reference axes and ruler ticks derived from the normalization bounds.

use crate::plot::bounds::{Axis, NormalizationBounds, PlotSize};
use crate::scene::{Polyline, SceneNode};
use glam::Vec3;

/// Ticks drawn along each axis.
pub const TICKS_PER_AXIS: usize = 10;
/// Axis lines extend this far past the plot extent.
pub const AXIS_OVERSHOOT: f32 = 1.5;
/// Tick arm length as a fraction of the perpendicular plot extents.
const TICK_ARM: f32 = 0.1;

/// Distance between consecutive ticks on `axis`: one raw data unit in plot
/// space. Zero for a degenerate axis.
pub fn tick_spacing(bounds: &NormalizationBounds, plot: &PlotSize, axis: Axis) -> f32 {
    match bounds.divisor(axis) {
        Ok(d) => (plot.along(axis) as f64 / d) as f32,
        Err(_) => 0.0,
    }
}

/// Line from the origin to 1.5x the plot extent of `axis`.
pub fn axis_line(plot: &PlotSize, axis: Axis) -> Polyline {
    Polyline {
        vertices: vec![Vec3::ZERO, axis.unit() * plot.along(axis) * AXIS_OVERSHOOT],
        color: axis.color(),
    }
}

/// The "L" shaped tick at `offset` along `axis`.
fn tick(plot: &PlotSize, axis: Axis, offset: f32) -> Polyline {
    let (ax, ay, az) = (plot.x * TICK_ARM, plot.y * TICK_ARM, plot.z * TICK_ARM);
    let vertices = match axis {
        Axis::X => vec![
            Vec3::new(offset, ay, 0.0),
            Vec3::new(offset, 0.0, 0.0),
            Vec3::new(offset, 0.0, az),
        ],
        Axis::Y => vec![
            Vec3::new(ax, offset, 0.0),
            Vec3::new(0.0, offset, 0.0),
            Vec3::new(0.0, offset, az),
        ],
        // X arm sized from the Z extent.
        Axis::Z => vec![
            Vec3::new(0.0, ay, offset),
            Vec3::new(0.0, 0.0, offset),
            Vec3::new(az, 0.0, offset),
        ],
    };
    Polyline {
        vertices,
        color: axis.color(),
    }
}

/// Builds three axis lines followed by ten ticks per axis.
///
/// Pure: the same bounds always yield the same geometry. Removing a previous
/// set from the scene is up to the caller.
pub fn annotate(bounds: &NormalizationBounds, plot: &PlotSize) -> Vec<SceneNode> {
    let mut nodes = Vec::with_capacity(3 + 3 * TICKS_PER_AXIS);

    for axis in Axis::ALL {
        nodes.push(SceneNode::AxisLine(axis_line(plot, axis)));
    }

    for axis in Axis::ALL {
        let spacing = tick_spacing(bounds, plot, axis);
        for k in 1..=TICKS_PER_AXIS {
            nodes.push(SceneNode::TickMark(tick(plot, axis, spacing * k as f32)));
        }
    }

    nodes
}
